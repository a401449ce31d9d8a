//! Downstream backend addresses and per-call timeouts.

use std::time::Duration;

use config::{Config as ConfigLib, Environment};
use serde::Deserialize;

/// Host/port pair for a downstream backend.
#[derive(Debug, Clone)]
pub struct ServiceAddr {
    pub host: String,
    pub port: u16,
}

impl ServiceAddr {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Addresses of the three backends this gateway orchestrates.
#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    pub rating: ServiceAddr,
    pub library: ServiceAddr,
    pub reservation: ServiceAddr,
    /// Connect timeout applied to every outbound call. The overall
    /// budget for a call still covers at least one connect retry on top
    /// of this (see `clients::send_with_connect_retry`).
    pub connect_timeout: Duration,
    /// Overall per-request timeout (includes body read).
    pub request_timeout: Duration,
}

/// Flat shape matching the fixed env var names exactly (lowercased,
/// which is how `config::Environment` keys its unprefixed source),
/// before it's regrouped into `DownstreamConfig`'s per-backend
/// `ServiceAddr`s.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawDownstreamConfig {
    rating_system_host: String,
    rating_system_port: u16,
    library_system_host: String,
    library_system_port: u16,
    reservation_system_host: String,
    reservation_system_port: u16,
}

impl Default for RawDownstreamConfig {
    fn default() -> Self {
        Self {
            rating_system_host: "rating".to_string(),
            rating_system_port: 8050,
            library_system_host: "library".to_string(),
            library_system_port: 8060,
            reservation_system_host: "reservation".to_string(),
            reservation_system_port: 8070,
        }
    }
}

impl From<RawDownstreamConfig> for DownstreamConfig {
    fn from(raw: RawDownstreamConfig) -> Self {
        Self {
            rating: ServiceAddr {
                host: raw.rating_system_host,
                port: raw.rating_system_port,
            },
            library: ServiceAddr {
                host: raw.library_system_host,
                port: raw.library_system_port,
            },
            reservation: ServiceAddr {
                host: raw.reservation_system_host,
                port: raw.reservation_system_port,
            },
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        RawDownstreamConfig::default().into()
    }
}

impl DownstreamConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let raw: RawDownstreamConfig = ConfigLib::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(raw.into())
    }
}
