//! Circuit breaker thresholds, shared by all three per-backend breakers.

use std::time::Duration;

use config::{Config as ConfigLib, Environment};
use serde::Deserialize;

/// Configured thresholds for every circuit breaker in the gateway — one
/// set of three thresholds, shared by every breaker instance, sourced
/// from the same three env vars for all backends.
#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub open_timeout: Duration,
}

/// Flat shape matching `CIRCUIT_BREAKER_FAILURE_THRESHOLD` /
/// `CIRCUIT_BREAKER_SUCCESS_THRESHOLD` / `CIRCUIT_BREAKER_TIMEOUT`
/// (lowercased, as `config::Environment` keys them) before `open_timeout`
/// is converted from raw seconds into a `Duration`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
struct RawCircuitBreakerConfig {
    circuit_breaker_failure_threshold: u32,
    circuit_breaker_success_threshold: u32,
    circuit_breaker_timeout: u64,
}

impl Default for RawCircuitBreakerConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_failure_threshold: 2,
            circuit_breaker_success_threshold: 1,
            circuit_breaker_timeout: 15,
        }
    }
}

impl From<RawCircuitBreakerConfig> for CircuitBreakerConfig {
    fn from(raw: RawCircuitBreakerConfig) -> Self {
        Self {
            failure_threshold: raw.circuit_breaker_failure_threshold,
            success_threshold: raw.circuit_breaker_success_threshold,
            open_timeout: Duration::from_secs(raw.circuit_breaker_timeout),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        RawCircuitBreakerConfig::default().into()
    }
}

impl CircuitBreakerConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let raw: RawCircuitBreakerConfig = ConfigLib::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.success_threshold, 1);
        assert_eq!(config.open_timeout, Duration::from_secs(15));
    }
}
