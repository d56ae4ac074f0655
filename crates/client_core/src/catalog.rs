use std::sync::Arc;

use shared::{
    domain::Event,
    protocol::{EventListResponse, EVENTS_PATH},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    error::ClientError,
    gateway::ApiGateway,
    view::{derive_view, FilterCriteria, SortKey},
};

const FETCH_FAILED_FALLBACK: &str = "Failed to fetch events";

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    LoadingChanged(bool),
    ViewRecomputed { len: usize },
    FetchFailed { message: String },
}

/// Read model of the catalog. `derived_view` always reflects the other fields.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub all_events: Vec<Event>,
    pub filter_criteria: FilterCriteria,
    pub sort_key: SortKey,
    pub derived_view: Vec<Event>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CatalogState {
    fn recompute(&mut self) -> usize {
        self.derived_view = derive_view(&self.all_events, &self.filter_criteria, &self.sort_key);
        self.derived_view.len()
    }
}

pub struct EventCatalogManager {
    api: Arc<dyn ApiGateway>,
    inner: Mutex<CatalogState>,
    fetch_gate: Mutex<()>,
    events: broadcast::Sender<CatalogEvent>,
}

impl EventCatalogManager {
    pub fn new(api: Arc<dyn ApiGateway>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            inner: Mutex::new(CatalogState::default()),
            fetch_gate: Mutex::new(()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Replaces the catalog from `GET /events`. Failures land in
    /// [`CatalogState::error`] and keep the previous catalog.
    pub async fn fetch_all(&self) {
        // Overlapping fetches run one after another.
        let _gate = self.fetch_gate.lock().await;

        {
            let mut guard = self.inner.lock().await;
            guard.loading = true;
            guard.error = None;
        }
        self.emit(CatalogEvent::LoadingChanged(true));

        let outcome = self.load_events().await;

        let mut emitted = Vec::with_capacity(2);
        {
            let mut guard = self.inner.lock().await;
            match outcome {
                Ok(events) => {
                    info!("catalog: fetched {} events", events.len());
                    guard.all_events = events;
                    let len = guard.recompute();
                    emitted.push(CatalogEvent::ViewRecomputed { len });
                }
                Err(err) => {
                    warn!("catalog: fetch failed: {err}");
                    let message = Some(err.user_message())
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| FETCH_FAILED_FALLBACK.to_string());
                    guard.error = Some(message.clone());
                    emitted.push(CatalogEvent::FetchFailed { message });
                }
            }
            guard.loading = false;
        }
        emitted.push(CatalogEvent::LoadingChanged(false));
        for event in emitted {
            self.emit(event);
        }
    }

    async fn load_events(&self) -> Result<Vec<Event>, ClientError> {
        let body = self.api.get(EVENTS_PATH, None).await?;
        let response: EventListResponse = serde_json::from_value(body)?;
        Ok(response.events)
    }

    pub async fn set_text_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.update(|state| state.filter_criteria.text_query = query)
            .await;
    }

    pub async fn set_category(&self, category: impl Into<String>) {
        let category = category.into();
        self.update(|state| state.filter_criteria.category = category)
            .await;
    }

    pub async fn set_date(&self, date: impl Into<String>) {
        let date = date.into();
        self.update(|state| state.filter_criteria.date = date).await;
    }

    pub async fn set_sort_key(&self, sort_key: impl Into<SortKey>) {
        let sort_key = sort_key.into();
        self.update(|state| state.sort_key = sort_key).await;
    }

    pub async fn clear_filters(&self) {
        self.update(|state| {
            state.filter_criteria = FilterCriteria::default();
            state.sort_key = SortKey::Date;
        })
        .await;
    }

    async fn update(&self, apply: impl FnOnce(&mut CatalogState)) {
        let len = {
            let mut guard = self.inner.lock().await;
            apply(&mut *guard);
            guard.recompute()
        };
        self.emit(CatalogEvent::ViewRecomputed { len });
    }

    fn emit(&self, event: CatalogEvent) {
        let _ = self.events.send(event);
    }

    pub async fn snapshot(&self) -> CatalogState {
        self.inner.lock().await.clone()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.inner.lock().await.all_events.clone()
    }

    pub async fn derived_view(&self) -> Vec<Event> {
        self.inner.lock().await.derived_view.clone()
    }

    pub async fn filter_criteria(&self) -> FilterCriteria {
        self.inner.lock().await.filter_criteria.clone()
    }

    pub async fn sort_key(&self) -> SortKey {
        self.inner.lock().await.sort_key.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
