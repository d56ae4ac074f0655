use std::sync::Arc;

use serde_json::json;
use shared::{
    domain::{Booking, BookingId, EventId},
    protocol::{
        cancel_booking_path, BookingListResponse, BookingResponse, CreateBookingRequest,
        BOOKINGS_PATH,
    },
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{auth::AuthSessionManager, error::ClientError, gateway::ApiGateway};

const FETCH_FAILED_FALLBACK: &str = "Failed to fetch bookings";

#[derive(Debug, Clone, Default)]
pub struct BookingState {
    pub bookings: Vec<Booking>,
    pub loading: bool,
    pub error: Option<String>,
}

/// The signed-in user's bookings. Every call is authorised with the current
/// session token.
pub struct BookingManager {
    api: Arc<dyn ApiGateway>,
    auth: Arc<AuthSessionManager>,
    inner: Mutex<BookingState>,
    fetch_gate: Mutex<()>,
}

impl BookingManager {
    pub fn new(api: Arc<dyn ApiGateway>, auth: Arc<AuthSessionManager>) -> Self {
        Self {
            api,
            auth,
            inner: Mutex::new(BookingState::default()),
            fetch_gate: Mutex::new(()),
        }
    }

    async fn bearer(&self) -> Result<String, ClientError> {
        self.auth.token().await.ok_or(ClientError::NotAuthenticated)
    }

    pub async fn fetch_bookings(&self) {
        let _gate = self.fetch_gate.lock().await;
        {
            let mut guard = self.inner.lock().await;
            guard.loading = true;
            guard.error = None;
        }

        let outcome = self.load_bookings().await;

        let mut guard = self.inner.lock().await;
        match outcome {
            Ok(bookings) => {
                info!("bookings: fetched {}", bookings.len());
                guard.bookings = bookings;
            }
            Err(err) => {
                warn!("bookings: fetch failed: {err}");
                let message = err.user_message();
                guard.error = Some(if message.trim().is_empty() {
                    FETCH_FAILED_FALLBACK.to_string()
                } else {
                    message
                });
            }
        }
        guard.loading = false;
    }

    async fn load_bookings(&self) -> Result<Vec<Booking>, ClientError> {
        let token = self.bearer().await?;
        let body = self.api.get(BOOKINGS_PATH, Some(&token)).await?;
        let response: BookingListResponse = serde_json::from_value(body)?;
        Ok(response.bookings)
    }

    pub async fn create_booking(
        &self,
        event_id: &EventId,
        number_of_seats: u32,
    ) -> Result<Booking, ClientError> {
        if number_of_seats == 0 {
            return Err(ClientError::Validation(
                "Select at least one seat".into(),
            ));
        }
        let token = self.bearer().await?;
        let request = CreateBookingRequest {
            event_id: event_id.clone(),
            number_of_seats,
        };
        let body = self
            .api
            .post(BOOKINGS_PATH, serde_json::to_value(&request)?, Some(&token))
            .await?;
        let BookingResponse { booking } = serde_json::from_value(body)?;

        info!(
            "bookings: booked {} seat(s) for event {}",
            booking.number_of_seats, booking.event_id
        );
        self.inner.lock().await.bookings.push(booking.clone());
        Ok(booking)
    }

    pub async fn cancel_booking(&self, booking_id: &BookingId) -> Result<Booking, ClientError> {
        let token = self.bearer().await?;
        let body = self
            .api
            .put(&cancel_booking_path(&booking_id.0), json!({}), Some(&token))
            .await?;
        let BookingResponse { booking } = serde_json::from_value(body)?;

        let mut guard = self.inner.lock().await;
        match guard.bookings.iter_mut().find(|existing| existing.id == booking.id) {
            Some(existing) => *existing = booking.clone(),
            None => guard.bookings.push(booking.clone()),
        }
        info!("bookings: cancelled {}", booking.id);
        Ok(booking)
    }

    pub async fn snapshot(&self) -> BookingState {
        self.inner.lock().await.clone()
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.inner.lock().await.bookings.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loading
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }
}

#[cfg(test)]
#[path = "tests/bookings_tests.rs"]
mod tests;
