use super::*;
use crate::test_support::{event, sample_events};

fn titles(events: &[Event]) -> Vec<&str> {
    events.iter().map(|event| event.title.as_str()).collect()
}

fn festival_lineup() -> Vec<Event> {
    let mut rock = event("rock", "Rock Gala", "2024-06-10T20:00:00.000Z", 45.0, 12);
    rock.category = "music".into();
    rock.location = "Harbour Arena".into();

    let mut poetry = event("poetry", "open mic", "2024-06-08", 0.0, 40);
    poetry.category = "literature".into();
    poetry.description = "Bring your own JAZZ poems".into();

    let mut brunch = event("brunch", "Brunch", "2024-06-10T09:30:00.000Z", 25.5, 12);
    brunch.category = "food".into();
    brunch.location = "Jazz Cafe".into();

    let mut mystery = event("tbd", "Mystery Event", "sometime soon", 15.0, 99);
    mystery.category = "music".into();

    vec![rock, poetry, brunch, mystery]
}

#[test]
fn sort_key_parses_known_keys_and_keeps_unknown_raw() {
    assert_eq!(SortKey::parse("price"), SortKey::Price);
    assert_eq!(SortKey::from("availability"), SortKey::Availability);
    assert_eq!(
        SortKey::parse("popularity"),
        SortKey::Unrecognized("popularity".into())
    );
    assert_eq!(SortKey::default(), SortKey::Date);
    assert_eq!(SortKey::Title.to_string(), "title");
}

#[test]
fn empty_criteria_returns_date_ordered_permutation() {
    let events = vec![
        event("c", "C", "2024-05-03", 1.0, 1),
        event("a", "A", "2024-05-01", 1.0, 1),
        event("b", "B", "2024-05-02", 1.0, 1),
    ];

    let view = derive_view(&events, &FilterCriteria::default(), &SortKey::Date);

    assert_eq!(view.len(), events.len());
    assert_eq!(titles(&view), vec!["A", "B", "C"]);
    // source untouched
    assert_eq!(titles(&events), vec!["C", "A", "B"]);
}

#[test]
fn undated_events_sort_last() {
    let view = derive_view(&festival_lineup(), &FilterCriteria::default(), &SortKey::Date);
    assert_eq!(
        titles(&view),
        vec!["open mic", "Brunch", "Rock Gala", "Mystery Event"]
    );
}

#[test]
fn price_sort_matches_worked_example() {
    let view = derive_view(&sample_events(), &FilterCriteria::default(), &SortKey::Price);
    assert_eq!(titles(&view), vec!["Art Fair", "Jazz Night"]);
}

#[test]
fn text_query_matches_worked_example() {
    let criteria = FilterCriteria {
        text_query: "jazz".into(),
        ..FilterCriteria::default()
    };
    let view = derive_view(&sample_events(), &criteria, &SortKey::Date);
    assert_eq!(titles(&view), vec!["Jazz Night"]);
}

#[test]
fn text_query_searches_title_description_and_location() {
    let lineup = festival_lineup();
    let criteria = FilterCriteria {
        text_query: "JaZz".into(),
        ..FilterCriteria::default()
    };

    let view = derive_view(&lineup, &criteria, &SortKey::Date);
    assert_eq!(titles(&view), vec!["open mic", "Brunch"]);

    let query = criteria.text_query.to_lowercase();
    for event in &lineup {
        let kept = view.iter().any(|candidate| candidate.id == event.id);
        assert_eq!(kept, matches_text(event, &query), "event {}", event.title);
    }
}

#[test]
fn category_filter_is_exact_and_case_sensitive() {
    let lineup = festival_lineup();
    let criteria = FilterCriteria {
        category: "music".into(),
        ..FilterCriteria::default()
    };
    let view = derive_view(&lineup, &criteria, &SortKey::Title);
    assert_eq!(titles(&view), vec!["Mystery Event", "Rock Gala"]);

    let criteria = FilterCriteria {
        category: "Music".into(),
        ..FilterCriteria::default()
    };
    assert!(derive_view(&lineup, &criteria, &SortKey::Title).is_empty());
}

#[test]
fn date_filter_truncates_to_calendar_day() {
    let criteria = FilterCriteria {
        date: "2024-06-10".into(),
        ..FilterCriteria::default()
    };
    let view = derive_view(&festival_lineup(), &criteria, &SortKey::Date);
    assert_eq!(titles(&view), vec!["Brunch", "Rock Gala"]);

    let criteria = FilterCriteria {
        date: "2024-06-10T23:59:00Z".into(),
        ..FilterCriteria::default()
    };
    assert_eq!(
        derive_view(&festival_lineup(), &criteria, &SortKey::Date).len(),
        2
    );
}

#[test]
fn unparseable_selected_date_matches_nothing() {
    let criteria = FilterCriteria {
        date: "next tuesday".into(),
        ..FilterCriteria::default()
    };
    assert!(derive_view(&festival_lineup(), &criteria, &SortKey::Date).is_empty());
}

#[test]
fn filters_compose_conjunctively() {
    let criteria = FilterCriteria {
        text_query: "a".into(),
        category: "music".into(),
        date: "2024-06-10".into(),
    };
    let view = derive_view(&festival_lineup(), &criteria, &SortKey::Price);
    assert_eq!(titles(&view), vec!["Rock Gala"]);
}

#[test]
fn price_sort_is_non_decreasing() {
    let view = derive_view(&festival_lineup(), &FilterCriteria::default(), &SortKey::Price);
    assert!(view.windows(2).all(|pair| pair[0].price <= pair[1].price));
    assert_eq!(view.len(), 4);
}

#[test]
fn availability_sort_is_non_increasing_and_stable() {
    let view = derive_view(
        &festival_lineup(),
        &FilterCriteria::default(),
        &SortKey::Availability,
    );
    assert!(view
        .windows(2)
        .all(|pair| pair[0].available_seats >= pair[1].available_seats));
    // Rock Gala and Brunch tie on 12 seats and keep catalog order.
    assert_eq!(
        titles(&view),
        vec!["Mystery Event", "open mic", "Rock Gala", "Brunch"]
    );
}

#[test]
fn title_sort_ignores_case() {
    let view = derive_view(&festival_lineup(), &FilterCriteria::default(), &SortKey::Title);
    assert_eq!(
        titles(&view),
        vec!["Brunch", "Mystery Event", "open mic", "Rock Gala"]
    );
    assert_eq!(compare_titles("apple", "Apple"), Ordering::Less);
    assert_eq!(compare_titles("Zebra", "apple"), Ordering::Greater);
}

#[test]
fn title_sort_places_accented_titles_by_base_letter() {
    let events = vec![
        event("z", "Zebra Run", "2024-05-01", 1.0, 1),
        event("e", "Éclair Tasting", "2024-05-01", 1.0, 1),
        event("f", "Food Fair", "2024-05-01", 1.0, 1),
    ];

    let view = derive_view(&events, &FilterCriteria::default(), &SortKey::Title);

    assert_eq!(
        titles(&view),
        vec!["Éclair Tasting", "Food Fair", "Zebra Run"]
    );
    assert_eq!(compare_titles("Eclair", "Éclair"), Ordering::Less);
    assert_eq!(compare_titles("éclair", "Éclair"), Ordering::Less);
    assert_eq!(compare_titles("Ärger", "Apfel"), Ordering::Greater);
}

#[test]
fn date_sort_applies_time_to_timestamp_and_date_only_dates() {
    let mut late = event("late", "Late", "2024-05-01T00:00:00.000Z", 1.0, 1);
    late.time = "21:00".into();
    let mut mid = event("mid", "Mid", "2024-05-01", 1.0, 1);
    mid.time = "12:00".into();
    let mut early = event("early", "Early", "2024-05-01T00:00:00.000Z", 1.0, 1);
    early.time = "09:00".into();

    let view = derive_view(
        &[late, mid, early],
        &FilterCriteria::default(),
        &SortKey::Date,
    );

    assert_eq!(titles(&view), vec!["Early", "Mid", "Late"]);
}

#[test]
fn empty_criteria_keeps_every_event() {
    let lineup = festival_lineup();
    let criteria = FilterCriteria::default();
    assert!(criteria.is_empty());

    let view = derive_view(&lineup, &criteria, &SortKey::Unrecognized(String::new()));
    assert_eq!(view, lineup);

    let narrowed = FilterCriteria {
        category: "music".into(),
        ..FilterCriteria::default()
    };
    assert!(!narrowed.is_empty());
    assert_eq!(derive_view(&lineup, &narrowed, &SortKey::Date).len(), 2);
}

#[test]
fn unrecognized_sort_key_keeps_catalog_order() {
    let lineup = festival_lineup();
    let view = derive_view(
        &lineup,
        &FilterCriteria::default(),
        &SortKey::Unrecognized("popularity".into()),
    );
    assert_eq!(titles(&view), titles(&lineup));
}
