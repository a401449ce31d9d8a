//! Saga orchestration: `ReserveBook` and `ReturnBook`.
//!
//! Each method is a plain async procedure over the three downstream
//! clients — it has no knowledge of the retry queue. The saga is a value
//! the caller (an HTTP handler or the retry worker) can re-invoke with
//! the same arguments; deciding whether a `GatewayError::RetryableFailure`
//! gets enqueued is the caller's job (see `retry_queue::SagaRetry` and
//! `http::handlers`).

use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::{LibraryClient, RatingClient, ReservationClient};
use crate::domain::{
    BookCondition, EnrichedReservation, ReservationStatus, ReserveBookResponse,
    ReservedBookRequest, ReturnedBookRequest,
};
use crate::error::GatewayError;

/// Holds the three downstream clients a saga needs. Cheaply cloneable —
/// each client is itself a thin `Arc`-free wrapper around a `reqwest::Client`
/// and a `CircuitBreaker` (both internally `Clone`).
#[derive(Clone)]
pub struct SagaOrchestrator {
    library: LibraryClient,
    reservation: ReservationClient,
    rating: RatingClient,
}

impl SagaOrchestrator {
    pub fn new(library: LibraryClient, reservation: ReservationClient, rating: RatingClient) -> Self {
        Self {
            library,
            reservation,
            rating,
        }
    }

    /// Checks the user's quota, creates the reservation, then decrements
    /// the library's available count — compensating (deleting the
    /// reservation) if the decrement fails.
    #[tracing::instrument(skip(self, request), fields(user = %username))]
    pub async fn reserve_book(
        &self,
        username: &str,
        request: &ReservedBookRequest,
    ) -> Result<ReserveBookResponse, GatewayError> {
        // Step 1: quota check inputs.
        let rented_count = self.reservation.rented_count(username).await;
        let rating = self.rating.get_rating(username).await;
        let (rented_count, rating) = match (rented_count, rating) {
            (Some(count), Some(rating)) => (count, rating),
            _ => {
                info!("RESERVING BOOK: reservation or rating backend unavailable");
                return Err(GatewayError::ServiceUnavailable);
            }
        };

        // Step 2: quota enforcement. No mutation has happened yet.
        if rented_count >= rating.stars {
            info!(rented_count, stars = rating.stars, "RESERVING BOOK: quota exceeded");
            return Err(GatewayError::PermissionDenied(
                "rented book count has reached the user's rating limit".to_string(),
            ));
        }

        // Step 3: create the reservation.
        let reservation = match self.reservation.create_reservation(username, request).await {
            Some(reservation) => reservation,
            None => {
                info!("RESERVING BOOK: reservation backend unavailable at create step");
                return Err(GatewayError::RetryableFailure(
                    "reservation backend unavailable".to_string(),
                ));
            }
        };

        // Step 4: decrement the library's available count, compensating
        // on failure by deleting the reservation just created.
        let decremented = self
            .library
            .reserve_book(reservation.library_uid, reservation.book_uid)
            .await;
        if !decremented {
            let compensated = self
                .reservation
                .delete_reservation(username, reservation.reservation_uid)
                .await;
            if !compensated {
                warn!(
                    reservation_uid = %reservation.reservation_uid,
                    "RESERVING BOOK: compensating delete failed, reservation may be orphaned"
                );
            }
            info!("RESERVING BOOK: library backend unavailable at decrement step");
            return Err(GatewayError::RetryableFailure(
                "library backend unavailable".to_string(),
            ));
        }

        // Step 5: enrichment (read-only, degrades to placeholders).
        let book = self
            .library
            .get_book(reservation.library_uid, reservation.book_uid)
            .await;
        let library = self.library.get_library(reservation.library_uid).await;

        info!("RESERVING BOOK: all done");
        Ok(ReserveBookResponse {
            reservation: EnrichedReservation::new(reservation, book, library),
            rating,
        })
    }

    /// Records the return, re-increments the library's available count,
    /// and adjusts the user's rating for condition/lateness — compensating
    /// (rolling the reservation back to `RENTED`, re-decrementing the
    /// library count) if a later step fails.
    #[tracing::instrument(skip(self, request), fields(user = %username, reservation_uid = %reservation_uid))]
    pub async fn return_book(
        &self,
        username: &str,
        reservation_uid: Uuid,
        request: &ReturnedBookRequest,
    ) -> Result<(), GatewayError> {
        let reservation = self.reservation.get_reservation(username, reservation_uid).await;
        let Some(reservation) = reservation else {
            info!("RETURNING BOOK: reservation backend unavailable");
            return Err(GatewayError::ServiceUnavailable);
        };

        let book = self
            .library
            .get_book(reservation.library_uid, reservation.book_uid)
            .await;
        if book.condition == BookCondition::Unknown {
            info!("RETURNING BOOK: library backend unavailable");
            return Err(GatewayError::ServiceUnavailable);
        }

        let mut delta_stars: i64 = 0;
        if book.condition != request.condition {
            delta_stars -= 10;
        }
        let new_status = if request.date > reservation.till_date {
            delta_stars -= 10;
            ReservationStatus::Expired
        } else {
            ReservationStatus::Returned
        };
        if delta_stars == 0 {
            delta_stars = 1;
        }

        // Step 3: increment the library's available count.
        if !self
            .library
            .return_book(reservation.library_uid, reservation.book_uid)
            .await
        {
            info!("RETURNING BOOK: library backend unavailable at increment step");
            return Err(GatewayError::RetryableFailure(
                "library backend unavailable".to_string(),
            ));
        }

        // Step 4: update reservation status, compensating by
        // decrementing the book count again on failure.
        let updated = self
            .reservation
            .update_reservation(username, reservation_uid, new_status)
            .await;
        if !updated {
            let _ = self
                .library
                .reserve_book(reservation.library_uid, reservation.book_uid)
                .await;
            info!("RETURNING BOOK: reservation backend unavailable at status-update step");
            return Err(GatewayError::RetryableFailure(
                "reservation backend unavailable".to_string(),
            ));
        }

        // Step 5: apply the rating delta, compensating both prior
        // mutations by rolling the reservation back to RENTED and
        // decrementing the book count again.
        if self.rating.update_rating(username, delta_stars).await.is_none() {
            let _ = self
                .reservation
                .update_reservation(username, reservation_uid, ReservationStatus::Rented)
                .await;
            let _ = self
                .library
                .reserve_book(reservation.library_uid, reservation.book_uid)
                .await;
            info!("RETURNING BOOK: rating backend unavailable at rating-update step");
            return Err(GatewayError::RetryableFailure(
                "rating backend unavailable".to_string(),
            ));
        }

        info!("RETURNING BOOK: all done");
        Ok(())
    }
}
