//! Single shared-credential token authority (§4.3/§6): the producer has no
//! user directory, only the one `username`/`password` pair configured
//! under `[http_client]` and shared with the consumer's `dasd-http::Client`.
//! A successful `POST /auth/api-token-auth/` mints a fresh random token and
//! replaces whatever was previously issued; every other endpoint checks the
//! presented `Authorization: Token <t>` header against it.

use rand::distr::{Alphanumeric, SampleString};
use tokio::sync::RwLock;

const TOKEN_LEN: usize = 40;
const AUTH_SCHEME_PREFIX: &str = "Token ";

/// Issues and validates the single active bearer token.
pub struct TokenAuthority {
    username: String,
    password: String,
    token: RwLock<Option<String>>,
}

impl TokenAuthority {
    /// Build an authority around the configured credential pair. No token
    /// is active until the first successful login.
    #[must_use]
    pub fn new(username: String, password: String) -> Self {
        Self {
            username,
            password,
            token: RwLock::new(None),
        }
    }

    /// Check `username`/`password` against the configured pair and, on
    /// success, mint and store a fresh token.
    pub async fn login(&self, username: &str, password: &str) -> Option<String> {
        if username != self.username || password != self.password {
            return None;
        }
        let token = Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LEN);
        *self.token.write().await = Some(token.clone());
        Some(token)
    }

    /// Validate an `Authorization` header value of the form `Token <t>`
    /// against the currently active token.
    pub async fn validate(&self, header_value: &str) -> bool {
        let Some(presented) = header_value.strip_prefix(AUTH_SCHEME_PREFIX) else {
            return false;
        };
        self.token.read().await.as_deref() == Some(presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_rejects_wrong_credentials() {
        let auth = TokenAuthority::new("dasd".to_string(), "secret".to_string());
        assert!(auth.login("dasd", "wrong").await.is_none());
    }

    #[tokio::test]
    async fn login_then_validate_round_trips() {
        let auth = TokenAuthority::new("dasd".to_string(), "secret".to_string());
        let token = auth.login("dasd", "secret").await.unwrap();
        assert!(auth.validate(&format!("Token {token}")).await);
        assert!(!auth.validate("Token wrong").await);
        assert!(!auth.validate(&token).await);
    }

    #[tokio::test]
    async fn a_fresh_login_invalidates_the_previous_token() {
        let auth = TokenAuthority::new("dasd".to_string(), "secret".to_string());
        let first = auth.login("dasd", "secret").await.unwrap();
        let second = auth.login("dasd", "secret").await.unwrap();
        assert_ne!(first, second);
        assert!(!auth.validate(&format!("Token {first}")).await);
        assert!(auth.validate(&format!("Token {second}")).await);
    }
}
