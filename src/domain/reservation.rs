use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::book::{Book, BookCondition};
use super::library::Library;
use super::rating::Rating;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    Rented,
    Returned,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub reservation_uid: Uuid,
    pub book_uid: Uuid,
    pub library_uid: Uuid,
    pub status: ReservationStatus,
    pub start_date: NaiveDate,
    pub till_date: NaiveDate,
}

/// Body of `POST /api/v1/reservations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedBookRequest {
    pub book_uid: Uuid,
    pub library_uid: Uuid,
    pub till_date: NaiveDate,
}

/// Body of `POST /api/v1/reservations/{uid}/return`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnedBookRequest {
    pub condition: BookCondition,
    pub date: NaiveDate,
}

/// A reservation enriched with the book and library it refers to —
/// the shape `GET /reservations` and the reserve saga's response both
/// return (`routers.py::get_reservations`, `ReservationResponse`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedReservation {
    pub reservation_uid: Uuid,
    pub status: ReservationStatus,
    pub start_date: NaiveDate,
    pub till_date: NaiveDate,
    pub book: Book,
    pub library: Library,
}

impl EnrichedReservation {
    pub fn new(reservation: Reservation, book: Book, library: Library) -> Self {
        Self {
            reservation_uid: reservation.reservation_uid,
            status: reservation.status,
            start_date: reservation.start_date,
            till_date: reservation.till_date,
            book,
            library,
        }
    }
}

/// Body of the successful `POST /api/v1/reservations` response
/// (`ReservationBookResponse` in the original gateway).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveBookResponse {
    #[serde(flatten)]
    pub reservation: EnrichedReservation,
    pub rating: Rating,
}
