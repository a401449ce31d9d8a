//! Shared application state handed to every axum handler.

use axum::extract::FromRef;

use crate::clients::{LibraryClient, RatingClient, ReservationClient};
use crate::http::auth::TokenStore;
use crate::retry_queue::RetryQueueHandle;
use crate::saga::SagaOrchestrator;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub library: LibraryClient,
    pub reservation: ReservationClient,
    pub rating: RatingClient,
    pub saga: SagaOrchestrator,
    pub retry_queue: RetryQueueHandle,
    pub tokens: TokenStore,
}
