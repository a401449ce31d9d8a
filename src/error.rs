//! Gateway-wide error types and their HTTP mapping.
//!
//! `GatewayError` is the boundary type between the saga orchestrator /
//! pass-through handlers and the HTTP front-end.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Errors surfaced from saga orchestration and pass-through handlers.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Malformed paging or body — never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Absent or invalid bearer token.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Business-rule rejection (quota exceeded) — never retried.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A dependency failed before any mutation occurred, or a read-only
    /// pass-through call failed.
    #[error("service unavailable")]
    ServiceUnavailable,

    /// A mutation step failed and compensation (if required) completed;
    /// the caller should enqueue this invocation for background retry.
    #[error("retryable failure: {0}")]
    RetryableFailure(String),

    /// Unexpected internal error (parse failure, bug) — never retried.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GatewayError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            GatewayError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthenticated".to_string()),
            GatewayError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            GatewayError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            ),
            // RetryableFailure never reaches here directly — handlers
            // intercept it to enqueue + return 204 — but map it sanely
            // if it ever propagates unhandled.
            GatewayError::RetryableFailure(_) => (StatusCode::NO_CONTENT, String::new()),
            GatewayError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        if message.is_empty() {
            return status.into_response();
        }

        (status, axum::Json(ErrorBody { message })).into_response()
    }
}
