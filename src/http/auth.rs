//! Bearer-token authentication.
//!
//! Real OAuth token issuance is explicitly out of scope for this
//! gateway, so this is a from-scratch minimal stand-in: `POST
//! /oauth/token` checks a username/password pair against `AuthConfig`'s
//! in-memory table and mints a random opaque token, kept in a
//! process-lifetime map from token to username. This is a stub, not an
//! OAuth2 grant type — a real deployment delegates this to a dedicated
//! auth service.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rand::distr::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;

use crate::config::AuthConfig;
use crate::error::GatewayError;

const TOKEN_LENGTH: usize = 32;

/// Process-lifetime token -> username table.
#[derive(Clone)]
pub struct TokenStore {
    config: Arc<AuthConfig>,
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl TokenStore {
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            config: Arc::new(auth),
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check a username/password pair and mint a new bearer token.
    pub async fn issue(&self, username: &str, password: &str) -> Option<String> {
        match self.config.users.get(username) {
            Some(expected) if expected == password => {
                let token: String = rand::rng()
                    .sample_iter(&Alphanumeric)
                    .take(TOKEN_LENGTH)
                    .map(char::from)
                    .collect();
                self.tokens.write().await.insert(token.clone(), username.to_string());
                Some(token)
            }
            _ => None,
        }
    }

    pub async fn authenticate(&self, token: &str) -> Option<String> {
        self.tokens.read().await.get(token).cloned()
    }
}

/// Extracted from `Authorization: Bearer <token>`, resolved to the
/// username that minted it. Any axum handler can take this as a plain
/// argument; failure to extract short-circuits to 401.
pub struct AuthenticatedUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    TokenStore: axum::extract::FromRef<S>,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let store = TokenStore::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(GatewayError::Unauthenticated)?;

        let token = header.strip_prefix("Bearer ").ok_or(GatewayError::Unauthenticated)?;

        match store.authenticate(token).await {
            Some(username) => Ok(AuthenticatedUser(username)),
            None => Err(GatewayError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(username: &str, password: &str) -> AuthConfig {
        let mut config = AuthConfig::default();
        config.users.insert(username.to_string(), password.to_string());
        config
    }

    #[tokio::test]
    async fn issues_a_token_for_valid_credentials() {
        let store = TokenStore::new(config_with("alice", "pw1"));
        let token = store.issue("alice", "pw1").await;
        assert!(token.is_some());
        let username = store.authenticate(&token.unwrap()).await;
        assert_eq!(username.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let store = TokenStore::new(config_with("alice", "pw1"));
        assert!(store.issue("alice", "wrong").await.is_none());
    }

    #[tokio::test]
    async fn unknown_token_does_not_authenticate() {
        let store = TokenStore::new(config_with("alice", "pw1"));
        assert!(store.authenticate("nonsense").await.is_none());
    }
}
