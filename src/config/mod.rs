//! Application configuration.
//!
//! Every environment variable name here is fixed by the deployment
//! tooling this gateway ships alongside, so each per-concern config is
//! loaded through the `config` crate's unprefixed `Environment` source
//! (matching the teacher's `Config::load`) deserialized into a typed
//! struct, rather than read field-by-field from `std::env`.

mod auth;
mod circuit_breaker;
mod downstream;
mod server;

pub use auth::AuthConfig;
pub use circuit_breaker::CircuitBreakerConfig;
pub use downstream::{DownstreamConfig, ServiceAddr};
pub use server::ServerConfig;

/// Top-level gateway configuration, assembled from the individual
/// per-concern configs below.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub downstream: DownstreamConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            downstream: DownstreamConfig::from_env()?,
            circuit_breaker: CircuitBreakerConfig::from_env()?,
            auth: AuthConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config {
            server: ServerConfig::default(),
            downstream: DownstreamConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            auth: AuthConfig::default(),
        };
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.circuit_breaker.failure_threshold, 2);
        assert_eq!(config.circuit_breaker.success_threshold, 1);
    }
}
