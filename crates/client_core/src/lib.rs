//! Client-side state for the event booking service.
//!
//! Managers own their state and are the only writers to it. They receive the
//! [`ApiGateway`] and [`storage::SessionStore`] they use at construction.

pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod error;
pub mod gateway;
pub mod view;

pub use auth::{AuthSessionManager, AuthState, Session};
pub use bookings::{BookingManager, BookingState};
pub use catalog::{CatalogEvent, CatalogState, EventCatalogManager};
pub use error::{ClientError, GatewayError};
pub use gateway::{ApiGateway, HttpApiGateway};
pub use view::{derive_view, FilterCriteria, SortKey};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
