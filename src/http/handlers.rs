//! Route handlers.
//!
//! Pass-through handlers are thin: one downstream call, a null-to-503
//! mapping, no orchestration. The two mutation handlers invoke the saga
//! orchestrator and, on a `RetryableFailure`, hand the original
//! arguments to the retry queue before responding `204`.

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{ReservedBookRequest, ReturnedBookRequest};
use crate::error::GatewayError;
use crate::http::auth::AuthenticatedUser;
use crate::http::state::AppState;
use crate::retry_queue::SagaRetry;

fn validate_paging(page: i64, size: i64) -> Result<(u32, u32), GatewayError> {
    if page < 0 {
        return Err(GatewayError::Validation(
            "Page should not be less then 0".to_string(),
        ));
    }
    if !(1..=100).contains(&size) {
        return Err(GatewayError::Validation(
            "Size should be between 1 and 100".to_string(),
        ));
    }
    Ok((page as u32, size as u32))
}

fn default_size() -> i64 {
    100
}

#[derive(Deserialize)]
pub struct LibrariesQuery {
    city: String,
    #[serde(default)]
    page: i64,
    #[serde(default = "default_size")]
    size: i64,
}

pub async fn list_libraries(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<LibrariesQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let (page, size) = validate_paging(query.page, query.size)?;
    let libraries = state
        .library
        .get_libraries(&query.city, page, size)
        .await
        .ok_or(GatewayError::ServiceUnavailable)?;
    Ok(Json(libraries))
}

#[derive(Deserialize)]
pub struct BooksQuery {
    #[serde(default)]
    page: i64,
    #[serde(default = "default_size")]
    size: i64,
    #[serde(default)]
    show_all: bool,
}

pub async fn list_books(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(library_uid): Path<Uuid>,
    Query(query): Query<BooksQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let (page, size) = validate_paging(query.page, query.size)?;
    let books = state
        .library
        .get_books(library_uid, page, size, query.show_all)
        .await
        .ok_or(GatewayError::ServiceUnavailable)?;
    Ok(Json(books))
}

pub async fn list_reservations(
    AuthenticatedUser(username): AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let reservations = state
        .reservation
        .get_reservations(&username)
        .await
        .ok_or(GatewayError::ServiceUnavailable)?;

    let mut enriched = Vec::with_capacity(reservations.len());
    for reservation in reservations {
        let book = state
            .library
            .get_book(reservation.library_uid, reservation.book_uid)
            .await;
        let library = state.library.get_library(reservation.library_uid).await;
        enriched.push(crate::domain::EnrichedReservation::new(reservation, book, library));
    }
    Ok(Json(enriched))
}

pub async fn reserve_book(
    AuthenticatedUser(username): AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<ReservedBookRequest>,
) -> Result<axum::response::Response, GatewayError> {
    match state.saga.reserve_book(&username, &request).await {
        Ok(response) => Ok(Json(response).into_response()),
        Err(GatewayError::RetryableFailure(reason)) => {
            tracing::info!(reason, "reserve deferred to retry queue");
            state.retry_queue.enqueue(SagaRetry::ReserveBookRetry { username, request });
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(other) => Err(other),
    }
}

pub async fn return_book(
    AuthenticatedUser(username): AuthenticatedUser,
    State(state): State<AppState>,
    Path(reservation_uid): Path<Uuid>,
    Json(request): Json<ReturnedBookRequest>,
) -> Result<axum::response::Response, GatewayError> {
    match state.saga.return_book(&username, reservation_uid, &request).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT.into_response()),
        Err(GatewayError::RetryableFailure(reason)) => {
            tracing::info!(reason, "return deferred to retry queue");
            state.retry_queue.enqueue(SagaRetry::ReturnBookRetry {
                username,
                reservation_uid,
                request,
            });
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(other) => Err(other),
    }
}

pub async fn get_rating(
    AuthenticatedUser(username): AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let rating = state
        .rating
        .get_rating(&username)
        .await
        .ok_or(GatewayError::ServiceUnavailable)?;
    Ok(Json(rating))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Deserialize)]
pub struct TokenRequest {
    username: String,
    password: String,
}

pub async fn issue_token(
    State(state): State<AppState>,
    Form(request): Form<TokenRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    match state.tokens.issue(&request.username, &request.password).await {
        Some(token) => Ok(Json(serde_json::json!({ "accessToken": token }))),
        None => Err(GatewayError::Unauthenticated),
    }
}
