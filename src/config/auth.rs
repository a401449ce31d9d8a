//! Seed data for the gateway's stub `/oauth/token` issuer.
//!
//! Real OAuth token issuance is out of scope for this gateway; this is
//! just enough of a user table to let the client-facing bearer-token
//! flow in `http::auth` exist in a standalone deployment.

use std::collections::HashMap;

use config::{Config as ConfigLib, Environment};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// username -> password, seeded from `GATEWAY_USERS`.
    pub users: HashMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
        }
    }
}

/// `GATEWAY_USERS=alice:pw1,bob:pw2` is a single delimited string, not a
/// shape `config::Environment` can parse into a map on its own, so it's
/// read as one field and split by hand below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawAuthConfig {
    gateway_users: String,
}

impl Default for RawAuthConfig {
    fn default() -> Self {
        Self {
            gateway_users: String::new(),
        }
    }
}

impl AuthConfig {
    /// Parse `GATEWAY_USERS=alice:pw1,bob:pw2` into a username/password
    /// table. Malformed entries (missing `:`) are skipped.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let raw: RawAuthConfig = ConfigLib::builder()
            .add_source(Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        let mut users = HashMap::new();
        for pair in raw.gateway_users.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            if let Some((username, password)) = pair.split_once(':') {
                users.insert(username.trim().to_string(), password.trim().to_string());
            }
        }
        Ok(Self { users })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_pairs() {
        std::env::set_var("GATEWAY_USERS", "alice:pw1, bob:pw2");
        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.users.get("alice").map(String::as_str), Some("pw1"));
        assert_eq!(config.users.get("bob").map(String::as_str), Some("pw2"));
        std::env::remove_var("GATEWAY_USERS");
    }

    #[test]
    fn skips_malformed_entries() {
        std::env::set_var("GATEWAY_USERS", "alice,bob:pw2");
        let config = AuthConfig::from_env().unwrap();
        assert!(!config.users.contains_key("alice"));
        assert_eq!(config.users.get("bob").map(String::as_str), Some("pw2"));
        std::env::remove_var("GATEWAY_USERS");
    }
}
