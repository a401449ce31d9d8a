//! HTTP clients for the three downstream backends this gateway fronts.
//!
//! Each client owns its own `reqwest::Client` and `CircuitBreaker` (one
//! breaker per backend, not per endpoint). All three share
//! the same status-code classification: a 5xx (or a connect timeout)
//! counts as a breaker failure, a 2xx counts as a breaker success, and
//! everything else (3xx/4xx, decode errors, plain request timeouts) is
//! passed through to the caller without moving the breaker's counters.

mod error;
mod library;
mod rating;
mod reservation;

pub use error::DownstreamError;
pub use library::LibraryClient;
pub use rating::RatingClient;
pub use reservation::ReservationClient;

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;

use crate::circuit_breaker::CallOutcome;

/// Build the shared `reqwest::Client` used by all three downstream
/// clients, honoring the configured connect/request timeouts.
pub(crate) fn build_http_client(
    connect_timeout: std::time::Duration,
    request_timeout: std::time::Duration,
) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(request_timeout)
        .build()
        .expect("reqwest client config is static and always valid")
}

/// Backoff budget for a single downstream call's own connect retry,
/// separate from the circuit breaker's failure counting.
fn connect_retry_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(50))
        .with_max_times(1)
}

/// Sends a request built fresh on every attempt, retrying once if — and
/// only if — the failure was a connect timeout. A 5xx, a decode error, or
/// any other transport failure is not a connect problem and is left for
/// the circuit breaker to classify on the first attempt.
pub(crate) async fn send_with_connect_retry<F>(build: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    (|| async { build().send().await })
        .retry(connect_retry_backoff())
        .when(|err: &reqwest::Error| err.is_connect())
        .await
}

/// Classify a response's status code into a breaker outcome.
pub(crate) fn classify_status(status: StatusCode) -> CallOutcome {
    if status.is_server_error() {
        CallOutcome::Failure
    } else if status.is_success() {
        CallOutcome::Success
    } else {
        CallOutcome::Uncounted
    }
}

/// Classify a transport-level `reqwest::Error` the way the original
/// `httpx`-based gateway distinguished `ConnectTimeout` from any other
/// exception: a timeout that occurred while establishing the connection
/// counts as a breaker failure, anything else does not.
pub(crate) fn classify_transport_error(err: reqwest::Error) -> (DownstreamError, CallOutcome) {
    if err.is_connect() && err.is_timeout() {
        (DownstreamError::ConnectTimeout, CallOutcome::Failure)
    } else if err.is_timeout() {
        (DownstreamError::RequestTimeout, CallOutcome::Uncounted)
    } else {
        (DownstreamError::Transport(err), CallOutcome::Uncounted)
    }
}
