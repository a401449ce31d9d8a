//! Client for the library backend (`LIBRARY_SYSTEM_HOST`/`PORT`).

use reqwest::Client;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{CircuitBreakerConfig, DownstreamConfig};
use crate::domain::{Book, BooksPage, LibrariesPage, Library};

use super::{build_http_client, classify_status, classify_transport_error, send_with_connect_retry};

#[derive(Clone)]
pub struct LibraryClient {
    http: Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl LibraryClient {
    pub fn new(downstream: &DownstreamConfig, breaker_config: &CircuitBreakerConfig) -> Self {
        Self {
            http: build_http_client(downstream.connect_timeout, downstream.request_timeout),
            base_url: downstream.library.base_url(),
            breaker: CircuitBreaker::new(
                "library",
                breaker_config.failure_threshold,
                breaker_config.success_threshold,
                breaker_config.open_timeout,
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(base_url: String) -> Self {
        let breaker_config = CircuitBreakerConfig::default();
        Self {
            http: build_http_client(
                std::time::Duration::from_secs(5),
                std::time::Duration::from_secs(10),
            ),
            base_url,
            breaker: CircuitBreaker::new(
                "library",
                breaker_config.failure_threshold,
                breaker_config.success_threshold,
                breaker_config.open_timeout,
            ),
        }
    }

    pub async fn get_libraries(&self, city: &str, page: u32, size: u32) -> Option<LibrariesPage> {
        let url = format!("{}/libraries", self.base_url);
        let query = [
            ("city", city.to_string()),
            ("page", page.to_string()),
            ("size", size.to_string()),
        ];
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.get(&url).query(&query)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<LibrariesPage>().await.ok()
                        } else {
                            None
                        };
                        (value, outcome)
                    }
                    Err(err) => {
                        let (_, outcome) = classify_transport_error(err);
                        (None, outcome)
                    }
                }
            })
            .await
    }

    /// Always returns a `Library` — a UID-only placeholder when the
    /// backend couldn't be reached, so enrichment never fails a saga
    /// that has already committed a mutation.
    pub async fn get_library(&self, library_uid: Uuid) -> Library {
        let url = format!("{}/libraries/{}", self.base_url, library_uid);
        let fetched = self
            .breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.get(&url)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<Library>().await.ok()
                        } else {
                            None
                        };
                        (value, outcome)
                    }
                    Err(err) => {
                        let (_, outcome) = classify_transport_error(err);
                        (None, outcome)
                    }
                }
            })
            .await;

        fetched.unwrap_or_else(|| Library::placeholder(library_uid))
    }

    pub async fn get_books(
        &self,
        library_uid: Uuid,
        page: u32,
        size: u32,
        show_all: bool,
    ) -> Option<BooksPage> {
        let url = format!("{}/libraries/{}/books", self.base_url, library_uid);
        let query = [
            ("page", page.to_string()),
            ("size", size.to_string()),
            ("show_all", show_all.to_string()),
        ];
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.get(&url).query(&query)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<BooksPage>().await.ok()
                        } else {
                            None
                        };
                        (value, outcome)
                    }
                    Err(err) => {
                        let (_, outcome) = classify_transport_error(err);
                        (None, outcome)
                    }
                }
            })
            .await
    }

    /// Always returns a `Book` — a UID-only placeholder with
    /// `condition: Unknown` when the backend couldn't be reached.
    pub async fn get_book(&self, library_uid: Uuid, book_uid: Uuid) -> Book {
        let url = format!("{}/libraries/{}/books/{}", self.base_url, library_uid, book_uid);
        let fetched = self
            .breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.get(&url)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<Book>().await.ok()
                        } else {
                            None
                        };
                        (value, outcome)
                    }
                    Err(err) => {
                        let (_, outcome) = classify_transport_error(err);
                        (None, outcome)
                    }
                }
            })
            .await;

        fetched.unwrap_or_else(|| Book::placeholder(book_uid))
    }

    /// Decrements the library's available count for `book_uid`. `true`
    /// only on an explicit 200 — same contract the original gateway
    /// enforced (`status_code != 200` is treated as a failed reserve).
    pub async fn reserve_book(&self, library_uid: Uuid, book_uid: Uuid) -> bool {
        self.mutate_book(library_uid, book_uid, "reserve").await
    }

    /// Increments the library's available count for `book_uid`.
    pub async fn return_book(&self, library_uid: Uuid, book_uid: Uuid) -> bool {
        self.mutate_book(library_uid, book_uid, "return").await
    }

    async fn mutate_book(&self, library_uid: Uuid, book_uid: Uuid, action: &str) -> bool {
        let url = format!(
            "{}/libraries/{}/books/{}/{}",
            self.base_url, library_uid, book_uid, action
        );
        let body = json!({ "libraryUid": library_uid, "bookUid": book_uid });
        let outcome = self
            .breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.post(&url).json(&body)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let ok = resp.status() == reqwest::StatusCode::OK;
                        (Some(ok), outcome)
                    }
                    Err(err) => {
                        let (_, outcome) = classify_transport_error(err);
                        (None, outcome)
                    }
                }
            })
            .await;

        match outcome {
            Some(true) => true,
            Some(false) | None => {
                debug!(library_uid = %library_uid, book_uid = %book_uid, action, "library mutation failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_book_returns_placeholder_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/libraries/11111111-1111-1111-1111-111111111111/books/22222222-2222-2222-2222-222222222222"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = LibraryClient::for_tests(server.uri());
        let library_uid = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let book_uid = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();

        let book = client.get_book(library_uid, book_uid).await;
        assert_eq!(book.book_uid, book_uid);
        assert_eq!(book.condition, crate::domain::BookCondition::Unknown);
    }

    #[tokio::test]
    async fn reserve_book_is_true_only_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = LibraryClient::for_tests(server.uri());
        let ok = client.reserve_book(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(ok);
    }

    #[tokio::test]
    async fn reserve_book_is_false_on_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let client = LibraryClient::for_tests(server.uri());
        let ok = client.reserve_book(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn five_consecutive_server_errors_trip_the_breaker() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = LibraryClient::for_tests(server.uri());
        // Default failure_threshold is 2.
        let _ = client.get_books(Uuid::new_v4(), 0, 10, false).await;
        let result = client.get_books(Uuid::new_v4(), 0, 10, false).await;
        assert!(result.is_none());
        assert_eq!(client.breaker.status().await, crate::circuit_breaker::CircuitStatus::Open);
    }
}
