//! Client for the rating backend (`RATING_SYSTEM_HOST`/`PORT`).

use reqwest::Client;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{CircuitBreakerConfig, DownstreamConfig};
use crate::domain::Rating;

use super::{build_http_client, classify_status, classify_transport_error, send_with_connect_retry};

#[derive(Clone)]
pub struct RatingClient {
    http: Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl RatingClient {
    pub fn new(downstream: &DownstreamConfig, breaker_config: &CircuitBreakerConfig) -> Self {
        Self {
            http: build_http_client(downstream.connect_timeout, downstream.request_timeout),
            base_url: downstream.rating.base_url(),
            breaker: CircuitBreaker::new(
                "rating",
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
                "rating",
                breaker_config.failure_threshold,
                breaker_config.success_threshold,
                breaker_config.open_timeout,
            ),
        }
    }

    pub async fn get_rating(&self, username: &str) -> Option<Rating> {
        let url = format!("{}/rating", self.base_url);
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.get(&url).header("X-User-Name", username)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<Rating>().await.ok()
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

    /// `POST /rating` with a signed delta — the rating backend owns the
    /// `[1, 100]` clamp and applies `stars += delta` itself
    /// (`rating_system/db/repository.py::update_rating`); this client
    /// ships the raw delta, not an absolute value.
    pub async fn update_rating(&self, username: &str, delta_stars: i64) -> Option<Rating> {
        #[derive(serde::Serialize)]
        struct RatingDelta {
            stars: i64,
        }

        let url = format!("{}/rating", self.base_url);
        let body = RatingDelta { stars: delta_stars };
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| {
                    self.http.post(&url).header("X-User-Name", username).json(&body)
                })
                .await
                {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<Rating>().await.ok()
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn get_rating_parses_stars() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "stars": 7 })))
            .mount(&server)
            .await;

        let client = RatingClient::for_tests(server.uri());
        let rating = client.get_rating("alice").await;
        assert_eq!(rating.map(|r| r.stars), Some(7));
    }

    #[tokio::test]
    async fn get_rating_returns_none_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

        let client = RatingClient::for_tests(server.uri());
        assert!(client.get_rating("alice").await.is_none());
    }
}
