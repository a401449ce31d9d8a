//! Client for the reservation backend (`RESERVATION_SYSTEM_HOST`/`PORT`).

use reqwest::Client;
use uuid::Uuid;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{CircuitBreakerConfig, DownstreamConfig};
use crate::domain::{Reservation, ReservationStatus, ReservedBookRequest};

use super::{build_http_client, classify_status, classify_transport_error, send_with_connect_retry};

#[derive(Clone)]
pub struct ReservationClient {
    http: Client,
    base_url: String,
    breaker: CircuitBreaker,
}

impl ReservationClient {
    pub fn new(downstream: &DownstreamConfig, breaker_config: &CircuitBreakerConfig) -> Self {
        Self {
            http: build_http_client(downstream.connect_timeout, downstream.request_timeout),
            base_url: downstream.reservation.base_url(),
            breaker: CircuitBreaker::new(
                "reservation",
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
                "reservation",
                breaker_config.failure_threshold,
                breaker_config.success_threshold,
                breaker_config.open_timeout,
            ),
        }
    }

    pub async fn get_reservations(&self, username: &str) -> Option<Vec<Reservation>> {
        let url = format!("{}/reservations", self.base_url);
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.get(&url).header("X-User-Name", username)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<Vec<Reservation>>().await.ok()
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

    pub async fn get_reservation(&self, username: &str, reservation_uid: Uuid) -> Option<Reservation> {
        let url = format!("{}/reservations/{}", self.base_url, reservation_uid);
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.get(&url).header("X-User-Name", username)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<Reservation>().await.ok()
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

    /// Count of currently-rented books for this user, used by the
    /// ReserveBook saga's quota check against their rating.
    pub async fn rented_count(&self, username: &str) -> Option<u32> {
        #[derive(serde::Deserialize)]
        struct RentedBooks {
            count: u32,
        }

        let url = format!("{}/rented", self.base_url);
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.get(&url).header("X-User-Name", username)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status().is_success() {
                            resp.json::<RentedBooks>().await.ok().map(|r| r.count)
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

    /// `POST /reservations` — the backend answers `201 Created` on
    /// success; anything else is treated as no reservation created.
    pub async fn create_reservation(
        &self,
        username: &str,
        request: &ReservedBookRequest,
    ) -> Option<Reservation> {
        let url = format!("{}/reservations", self.base_url);
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| {
                    self.http.post(&url).header("X-User-Name", username).json(request)
                })
                .await
                {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let value = if resp.status() == reqwest::StatusCode::CREATED {
                            resp.json::<Reservation>().await.ok()
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

    /// `POST /reservations/{uid}/return` — used both to record a real
    /// return and, as compensation, to revert a reservation back to
    /// `RENTED` when a later saga step fails.
    pub async fn update_reservation(
        &self,
        username: &str,
        reservation_uid: Uuid,
        status: ReservationStatus,
    ) -> bool {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ReservationUpdate {
            status: ReservationStatus,
        }

        let url = format!("{}/reservations/{}/return", self.base_url, reservation_uid);
        let body = ReservationUpdate { status };
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| {
                    self.http.post(&url).header("X-User-Name", username).json(&body)
                })
                .await
                {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let ok = resp.status() == reqwest::StatusCode::NO_CONTENT;
                        (Some(ok), outcome)
                    }
                    Err(err) => {
                        let (_, outcome) = classify_transport_error(err);
                        (None, outcome)
                    }
                }
            })
            .await
            .unwrap_or(false)
    }

    /// Compensation for a ReserveBook saga that failed after the
    /// reservation was created.
    pub async fn delete_reservation(&self, username: &str, reservation_uid: Uuid) -> bool {
        let url = format!("{}/reservations/{}", self.base_url, reservation_uid);
        self.breaker
            .request(|| async {
                match send_with_connect_retry(|| self.http.delete(&url).header("X-User-Name", username)).await {
                    Ok(resp) => {
                        let outcome = classify_status(resp.status());
                        let ok = resp.status() == reqwest::StatusCode::NO_CONTENT;
                        (Some(ok), outcome)
                    }
                    Err(err) => {
                        let (_, outcome) = classify_transport_error(err);
                        (None, outcome)
                    }
                }
            })
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_reservation_requires_201() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let client = ReservationClient::for_tests(server.uri());
        let request = ReservedBookRequest {
            book_uid: Uuid::new_v4(),
            library_uid: Uuid::new_v4(),
            till_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        };
        let reservation = client.create_reservation("alice", &request).await;
        assert!(reservation.is_none(), "200 is not 201, must not be treated as created");
    }

    #[tokio::test]
    async fn update_reservation_is_true_only_on_204() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(204)).mount(&server).await;

        let client = ReservationClient::for_tests(server.uri());
        let ok = client
            .update_reservation("alice", Uuid::new_v4(), ReservationStatus::Returned)
            .await;
        assert!(ok);
    }
}
