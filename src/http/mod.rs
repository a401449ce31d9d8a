//! HTTP front-end: route wiring, auth extractor, and shared application
//! state. Handlers themselves live in `handlers`.

pub mod auth;
mod handlers;
mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full route table. `/manage/health` and `/oauth/token` are
/// mounted without the `/api/v1` prefix, matching the original gateway's
/// `main.py`, which wires its health check straight onto the root app
/// rather than the versioned API router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/libraries", get(handlers::list_libraries))
        .route("/libraries/:library_uid/books", get(handlers::list_books))
        .route("/reservations", get(handlers::list_reservations).post(handlers::reserve_book))
        .route("/reservations/:reservation_uid/return", post(handlers::return_book))
        .route("/rating", get(handlers::get_rating));

    Router::new()
        .route("/manage/health", get(handlers::health))
        .route("/oauth/token", post(handlers::issue_token))
        .nest("/api/v1", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{LibraryClient, RatingClient, ReservationClient};
    use crate::config::AuthConfig;
    use crate::retry_queue::RetryQueue;
    use crate::saga::SagaOrchestrator;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let library = LibraryClient::for_tests("http://127.0.0.1:1".to_string());
        let reservation = ReservationClient::for_tests("http://127.0.0.1:1".to_string());
        let rating = RatingClient::for_tests("http://127.0.0.1:1".to_string());
        let saga = SagaOrchestrator::new(library.clone(), reservation.clone(), rating.clone());
        let (retry_queue, _queue) = RetryQueue::new();
        AppState {
            library,
            reservation,
            rating,
            saga,
            retry_queue,
            tokens: auth::TokenStore::new(AuthConfig::default()),
        }
    }

    #[tokio::test]
    async fn health_check_does_not_require_auth() {
        let app = router(test_state());
        let req = Request::builder().uri("/manage/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_routes_require_a_bearer_token() {
        let app = router(test_state());
        let req = Request::builder()
            .uri("/api/v1/rating")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_credentials_are_rejected_at_token_issuance() {
        let app = router(test_state());
        let req = Request::builder()
            .uri("/oauth/token")
            .method("POST")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("username=nobody&password=wrong"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
