use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical condition of a book, as recorded by the library backend.
///
/// `Unknown` is a gateway-only sentinel: the library backend never emits
/// it, the gateway substitutes it when the library backend was
/// unavailable for a read that the saga cannot simply fail on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookCondition {
    Excellent,
    Good,
    Bad,
    Unknown,
}

/// A book as returned by the library backend (or synthesized as a
/// UID-only placeholder when the backend was unavailable).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub book_uid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default = "unknown_condition")]
    pub condition: BookCondition,
}

fn unknown_condition() -> BookCondition {
    BookCondition::Unknown
}

impl Book {
    /// Placeholder used when the library backend could not be reached for
    /// an enrichment fetch. Only the UID is populated, condition is the
    /// `Unknown` sentinel.
    pub fn placeholder(book_uid: Uuid) -> Self {
        Self {
            book_uid,
            name: String::new(),
            author: String::new(),
            genre: String::new(),
            condition: BookCondition::Unknown,
        }
    }
}

/// A book as it appears in a library's paged catalog listing — like
/// `Book`, but also carries the count currently available to reserve.
/// The library backend's `BookInfoResponse` schema adds this field only
/// to the listing endpoint; single-book fetches and saga enrichment use
/// the plain `Book` shape without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListing {
    pub book_uid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default = "unknown_condition")]
    pub condition: BookCondition,
    #[serde(default)]
    pub available_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooksPage {
    pub page: u32,
    pub page_size: u32,
    pub total_elements: u32,
    pub items: Vec<BookListing>,
}
