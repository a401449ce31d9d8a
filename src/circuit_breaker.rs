//! Per-downstream circuit breaker.
//!
//! One `CircuitBreaker` guards one downstream client. State lives for the
//! process's lifetime behind a `tokio::sync::Mutex`; the `request`
//! method wraps a single outbound call and decides, from the response,
//! whether to trip, recover, or pass the response through untouched.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// The three states a breaker can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

struct CircuitBreakerState {
    status: CircuitStatus,
    failure_count: u32,
    success_count: u32,
    /// Bumped on every transition so a timer fired by a stale transition
    /// can recognize it is stale and no-op instead of clobbering a newer
    /// state.
    generation: u64,
}

/// Outcome of a single downstream call, as classified by the caller
/// (the downstream client knows how to tell a connect-timeout from a
/// 5xx from a 2xx/3xx/4xx).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// A 2xx response. Counts toward `success_count` in HALF_OPEN; a
    /// no-op in CLOSED (counters only move on failure there).
    Success,
    /// Connect-timeout or a 5xx response — always counts toward
    /// tripping/re-tripping the breaker.
    Failure,
    /// A 3xx/4xx response, or any other exception (parse error, DNS
    /// failure, ...). Application-level outcome, not a dependency health
    /// signal. Never changes breaker counters in either state.
    Uncounted,
}

/// A per-downstream circuit breaker.
///
/// Cheaply cloneable: the shared state lives behind an `Arc<Mutex<_>>`,
/// so every downstream client can hold its own breaker value without
/// wrapping it in another `Arc` at the call site.
#[derive(Clone)]
pub struct CircuitBreaker {
    name: &'static str,
    failure_threshold: u32,
    success_threshold: u32,
    open_timeout: Duration,
    state: Arc<Mutex<CircuitBreakerState>>,
}

impl CircuitBreaker {
    pub fn new(
        name: &'static str,
        failure_threshold: u32,
        success_threshold: u32,
        open_timeout: Duration,
    ) -> Self {
        Self {
            name,
            failure_threshold,
            success_threshold,
            open_timeout,
            state: Arc::new(Mutex::new(CircuitBreakerState {
                status: CircuitStatus::Closed,
                failure_count: 0,
                success_count: 0,
                generation: 0,
            })),
        }
    }

    /// Current status, mostly useful for tests and health/metrics.
    pub async fn status(&self) -> CircuitStatus {
        self.state.lock().await.status
    }

    /// Guard a single downstream call.
    ///
    /// `call` performs the actual I/O and classifies its own result into
    /// a `(T, CallOutcome)` pair — `T` is whatever the downstream client
    /// wants to hand back (typically `Option<Response>` already parsed,
    /// or a raw `reqwest::Response`). Returns `None` when the breaker is
    /// OPEN (no call attempted) or when the call itself reports
    /// unavailability; returns `Some(value)` otherwise.
    pub async fn request<T, F, Fut>(&self, call: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = (Option<T>, CallOutcome)>,
    {
        let status = self.state.lock().await.status;

        match status {
            CircuitStatus::Closed => {
                let (value, outcome) = call().await;
                // Only a real failure moves the counters; success and
                // uncounted passthrough (3xx/4xx) are both no-ops here.
                if outcome == CallOutcome::Failure {
                    self.on_closed_failure().await;
                }
                value
            }
            CircuitStatus::Open => {
                debug!(breaker = self.name, "circuit open, call skipped");
                None
            }
            CircuitStatus::HalfOpen => {
                let (value, outcome) = call().await;
                match outcome {
                    CallOutcome::Success => self.on_half_open_success().await,
                    CallOutcome::Failure => self.on_half_open_failure().await,
                    CallOutcome::Uncounted => {}
                }
                value
            }
        }
    }

    async fn on_closed_failure(&self) {
        let mut state = self.state.lock().await;
        state.failure_count += 1;
        if state.failure_count >= self.failure_threshold {
            state.status = CircuitStatus::Open;
            state.generation += 1;
            warn!(breaker = self.name, "circuit breaker tripped OPEN");
            self.arm_timer(state.generation);
        }
    }

    async fn on_half_open_success(&self) {
        let mut state = self.state.lock().await;
        state.success_count += 1;
        if state.success_count >= self.success_threshold {
            state.status = CircuitStatus::Closed;
            state.failure_count = 0;
            info!(breaker = self.name, "circuit breaker recovered to CLOSED");
        }
    }

    async fn on_half_open_failure(&self) {
        let mut state = self.state.lock().await;
        state.status = CircuitStatus::Open;
        state.generation += 1;
        warn!(breaker = self.name, "circuit breaker re-tripped OPEN from HALF_OPEN");
        self.arm_timer(state.generation);
    }

    /// Fire-and-forget timer, never awaited by the request path.
    /// Re-checks `generation` on fire so a stale timer from an earlier
    /// OPEN transition can't clobber a breaker that has since re-opened.
    fn arm_timer(&self, generation: u64) {
        let state = self.state.clone();
        let timeout = self.open_timeout;
        let name = self.name;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let mut state = state.lock().await;
            if state.generation != generation {
                debug!(breaker = name, "stale timer, ignoring");
                return;
            }
            state.status = CircuitStatus::HalfOpen;
            state.success_count = 0;
            info!(breaker = name, "circuit breaker HALF_OPEN, probing");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new("test", 2, 1, Duration::from_millis(20))
    }

    #[tokio::test]
    async fn closed_breaker_allows_calls_and_passes_through_success() {
        let cb = breaker();
        let result = cb
            .request(|| async { (Some(42), CallOutcome::Success) })
            .await;
        assert_eq!(result, Some(42));
        assert_eq!(cb.status().await, CircuitStatus::Closed);
    }

    #[tokio::test]
    async fn trips_open_after_failure_threshold_consecutive_failures() {
        let cb = breaker();
        for _ in 0..1 {
            let r = cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
            assert_eq!(r, None);
        }
        // Threshold is 2 — still closed after 1 failure.
        assert_eq!(cb.status().await, CircuitStatus::Closed);

        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        assert_eq!(cb.status().await, CircuitStatus::Open);
    }

    #[tokio::test]
    async fn open_breaker_skips_the_call_entirely() {
        let cb = breaker();
        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        assert_eq!(cb.status().await, CircuitStatus::Open);

        let mut called = false;
        let result = cb
            .request(|| {
                called = true;
                async { (Some(1), CallOutcome::Success) }
            })
            .await;
        assert_eq!(result, None);
        assert!(!called, "call must not be attempted while OPEN");
    }

    #[tokio::test]
    async fn half_open_closes_after_success_threshold_and_resets_failure_count() {
        let cb = breaker();
        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        assert_eq!(cb.status().await, CircuitStatus::Open);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cb.status().await, CircuitStatus::HalfOpen);

        let result = cb.request(|| async { (Some(1), CallOutcome::Success) }).await;
        assert_eq!(result, Some(1));
        assert_eq!(cb.status().await, CircuitStatus::Closed);
    }

    #[tokio::test]
    async fn half_open_trips_back_to_open_on_single_failure() {
        let cb = breaker();
        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cb.status().await, CircuitStatus::HalfOpen);

        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        assert_eq!(cb.status().await, CircuitStatus::Open);
    }

    #[tokio::test]
    async fn closed_breaker_does_not_count_uncounted_outcomes_as_failures() {
        let cb = breaker();
        for _ in 0..5 {
            cb.request(|| async { (Some(404), CallOutcome::Uncounted) }).await;
        }
        assert_eq!(cb.status().await, CircuitStatus::Closed);
    }

    #[tokio::test]
    async fn half_open_uncounted_outcome_passes_through_without_state_change() {
        let cb = breaker();
        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        cb.request(|| async { (None::<()>, CallOutcome::Failure) }).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cb.status().await, CircuitStatus::HalfOpen);

        let result = cb.request(|| async { (Some(404), CallOutcome::Uncounted) }).await;
        assert_eq!(result, Some(404));
        // Neither closed (no success counted) nor re-opened.
        assert_eq!(cb.status().await, CircuitStatus::HalfOpen);
    }
}
