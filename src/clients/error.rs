//! Client-level error type.
//!
//! This sits below `GatewayError`: the circuit breaker and the saga
//! orchestrator only care about "did the call come back" — they collapse
//! everything here to `None` via `classify_transport_error`, which also
//! decides the breaker outcome directly rather than through a method on
//! this type.

#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    #[error("connect timeout")]
    ConnectTimeout,
    #[error("request timeout")]
    RequestTimeout,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
