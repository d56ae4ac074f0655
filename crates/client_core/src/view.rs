//! Display-ready event view: filtering and ordering over a fetched catalog.
//!
//! [`derive_view`] never mutates its input; every call returns a fresh list.

use std::{cmp::Ordering, fmt};

use chrono::{NaiveDate, NaiveDateTime};
use shared::domain::{parse_calendar_day, Event};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub text_query: String,
    pub category: String,
    /// Calendar day as `YYYY-MM-DD` or any timestamp on that day.
    pub date: String,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.text_query.is_empty() && self.category.is_empty() && self.date.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Date,
    Title,
    Price,
    Availability,
    /// Keeps the catalog order.
    Unrecognized(String),
}

impl SortKey {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "date" => Self::Date,
            "title" => Self::Title,
            "price" => Self::Price,
            "availability" => Self::Availability,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Date => "date",
            Self::Title => "title",
            Self::Price => "price",
            Self::Availability => "availability",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<&str> for SortKey {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn derive_view(events: &[Event], criteria: &FilterCriteria, sort_key: &SortKey) -> Vec<Event> {
    let mut view = if criteria.is_empty() {
        events.to_vec()
    } else {
        filter_events(events, criteria)
    };
    sort_events(&mut view, sort_key);
    view
}

fn filter_events(events: &[Event], criteria: &FilterCriteria) -> Vec<Event> {
    let query = criteria.text_query.to_lowercase();
    // An unparseable selected day matches nothing.
    let selected_day: Option<Option<NaiveDate>> = if criteria.date.is_empty() {
        None
    } else {
        Some(parse_calendar_day(&criteria.date))
    };

    events
        .iter()
        .filter(|event| matches_text(event, &query))
        .filter(|event| matches_category(event, &criteria.category))
        .filter(|event| matches_day(event, selected_day))
        .cloned()
        .collect()
}

/// `query` must already be lowercased.
pub fn matches_text(event: &Event, query: &str) -> bool {
    query.is_empty()
        || event.title.to_lowercase().contains(query)
        || event.description.to_lowercase().contains(query)
        || event.location.to_lowercase().contains(query)
}

fn matches_category(event: &Event, category: &str) -> bool {
    category.is_empty() || event.category == category
}

fn matches_day(event: &Event, selected_day: Option<Option<NaiveDate>>) -> bool {
    match selected_day {
        None => true,
        Some(None) => false,
        Some(Some(day)) => event.calendar_day() == Some(day),
    }
}

/// Stable in-place sort. Events whose date cannot be parsed sort after dated ones.
pub fn sort_events(events: &mut [Event], sort_key: &SortKey) {
    match sort_key {
        SortKey::Date => events.sort_by_cached_key(|event| DateKey(event.scheduled_at())),
        SortKey::Title => events.sort_by(|a, b| compare_titles(&a.title, &b.title)),
        SortKey::Price => events.sort_by(|a, b| a.price.total_cmp(&b.price)),
        SortKey::Availability => {
            events.sort_by(|a, b| b.available_seats.cmp(&a.available_seats))
        }
        SortKey::Unrecognized(_) => {}
    }
}

/// Primary order ignores case and diacritics, so "Éclair" sorts among the
/// E titles and "apple" next to "Apple". Accents break ties, then case.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        // lowercase before uppercase
        .then_with(|| b.cmp(a))
}

fn base_letters(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[derive(PartialEq, Eq)]
struct DateKey(Option<NaiveDateTime>);

impl PartialOrd for DateKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DateKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
