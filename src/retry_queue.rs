//! The background retry queue.
//!
//! An unbounded FIFO of deferred saga invocations. `Enqueue` is
//! non-blocking and always succeeds; a single background worker drains
//! the queue, re-invoking each saga by tag via a `SagaRetry` enum
//! dispatched by match arm.

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{ReservedBookRequest, ReturnedBookRequest};
use crate::error::GatewayError;
use crate::saga::SagaOrchestrator;

/// A saga invocation deferred for background retry, tagged by which
/// saga it re-runs and carrying that saga's exact original arguments.
///
/// Retries are not deduplicated and reservation creation is not
/// idempotent at this layer — a `ReserveBookRetry` that eventually
/// succeeds after several failed attempts relies on the reservation
/// backend never having partially committed a prior attempt; this
/// gateway does not attach an idempotency key.
#[derive(Debug, Clone)]
pub enum SagaRetry {
    ReserveBookRetry {
        username: String,
        request: ReservedBookRequest,
    },
    ReturnBookRetry {
        username: String,
        reservation_uid: Uuid,
        request: ReturnedBookRequest,
    },
}

impl SagaRetry {
    pub fn reserve(username: impl Into<String>, book_uid: Uuid, library_uid: Uuid, till_date: NaiveDate) -> Self {
        Self::ReserveBookRetry {
            username: username.into(),
            request: ReservedBookRequest {
                book_uid,
                library_uid,
                till_date,
            },
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SagaRetry::ReserveBookRetry { .. } => "reserve_book",
            SagaRetry::ReturnBookRetry { .. } => "return_book",
        }
    }
}

/// Handle used by HTTP handlers to defer a saga invocation. Cheaply
/// cloneable — it's just an `UnboundedSender` clone.
#[derive(Clone)]
pub struct RetryQueueHandle {
    sender: mpsc::UnboundedSender<SagaRetry>,
}

impl RetryQueueHandle {
    /// Non-blocking, always succeeds unless the worker has already shut
    /// down, which only happens at process exit.
    pub fn enqueue(&self, entry: SagaRetry) {
        if self.sender.send(entry).is_err() {
            warn!("retry queue worker has shut down, dropping entry");
        }
    }
}

/// Owns the receiving end; `spawn_worker` consumes it to start the
/// single background worker task.
pub struct RetryQueue {
    receiver: mpsc::UnboundedReceiver<SagaRetry>,
}

impl RetryQueue {
    pub fn new() -> (RetryQueueHandle, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (RetryQueueHandle { sender }, Self { receiver })
    }

    /// Starts the single dedicated worker loop: dequeue, dispatch by
    /// tag, re-enqueue on `RetryableFailure`, otherwise drop. `shutdown`
    /// cancels the loop without draining the queue — losing whatever is
    /// in flight at shutdown is acceptable.
    pub fn spawn_worker(
        mut self,
        orchestrator: SagaOrchestrator,
        handle: RetryQueueHandle,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let entry = tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("retry queue worker shutting down");
                        break;
                    }
                    entry = self.receiver.recv() => entry,
                };

                let Some(entry) = entry else {
                    break;
                };

                let label = entry.label();
                match dispatch(&orchestrator, entry.clone()).await {
                    Ok(()) => debug!(saga = label, "retry succeeded"),
                    Err(GatewayError::RetryableFailure(reason)) => {
                        info!(saga = label, reason, "retry failed again, re-enqueuing");
                        handle.enqueue(entry);
                        // A small delay avoids a tight spin when this is
                        // the only entry in the queue and the downstream
                        // is still down.
                        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                    }
                    Err(other) => {
                        warn!(saga = label, error = %other, "retry dropped, not retryable");
                    }
                }
            }
        })
    }
}

async fn dispatch(orchestrator: &SagaOrchestrator, entry: SagaRetry) -> Result<(), GatewayError> {
    match entry {
        SagaRetry::ReserveBookRetry { username, request } => {
            orchestrator.reserve_book(&username, &request).await.map(|_| ())
        }
        SagaRetry::ReturnBookRetry {
            username,
            reservation_uid,
            request,
        } => orchestrator.return_book(&username, reservation_uid, &request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{LibraryClient, RatingClient, ReservationClient};
    use chrono::NaiveDate;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn enqueue_is_non_blocking_and_worker_drains_fifo() {
        let library = MockServer::start().await;
        let reservation = MockServer::start().await;
        let rating = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rented"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "count": 0 })))
            .mount(&reservation)
            .await;
        Mock::given(method("GET"))
            .and(path("/rating"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "stars": 5 })))
            .mount(&rating)
            .await;
        Mock::given(method("POST"))
            .and(path("/reservations"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "reservationUid": "33333333-3333-3333-3333-333333333333",
                "bookUid": "22222222-2222-2222-2222-222222222222",
                "libraryUid": "11111111-1111-1111-1111-111111111111",
                "status": "RENTED",
                "startDate": "2026-07-01",
                "tillDate": "2026-08-01",
            })))
            .mount(&reservation)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/libraries/.*/books/.*/reserve$"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&library)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/libraries/.*/books/.*$"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&library)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/libraries/.*$"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&library)
            .await;

        let orchestrator = SagaOrchestrator::new(
            LibraryClient::for_tests(library.uri()),
            ReservationClient::for_tests(reservation.uri()),
            RatingClient::for_tests(rating.uri()),
        );

        let (handle, queue) = RetryQueue::new();
        let shutdown = CancellationToken::new();
        handle.enqueue(SagaRetry::reserve(
            "alice",
            Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap(),
            Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap(),
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        ));

        let worker = queue.spawn_worker(orchestrator, handle, shutdown.clone());
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        shutdown.cancel();
        let _ = worker.await;
    }
}
