//! # Design
//!
//! - Distinguish transport failures from protocol-level failures so callers
//!   can apply the retry policy in §7 ("transient request errors" vs.
//!   "authorization errors" vs. "not-found errors") without re-inspecting a
//!   status code.

use thiserror::Error;

/// Result type for HTTP client operations.
pub type HttpResult<T> = Result<T, HttpError>;

/// Errors produced by the token-lifecycle HTTP client.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The underlying HTTP transport failed (timeout, connection refused, TLS, ...).
    #[error("http transport failure")]
    Transport {
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// A configured or supplied URL failed to parse.
    #[error("invalid URL: {value}")]
    InvalidUrl {
        /// Raw value that failed to parse.
        value: String,
        /// Underlying parse failure.
        source: url::ParseError,
    },
    /// The token endpoint rejected the configured credentials.
    #[error("token request failed with status {status}")]
    TokenRequestFailed {
        /// HTTP status code returned by the token endpoint.
        status: u16,
    },
    /// The token endpoint's response body did not contain a usable token.
    #[error("token response was malformed")]
    MalformedTokenResponse,
    /// The requested resource does not exist (404).
    #[error("resource not found")]
    NotFound,
    /// The request was rejected as unauthorized even after a token refresh.
    #[error("request forbidden after token refresh")]
    Forbidden,
    /// The server reported an error status not covered by a more specific variant.
    #[error("unexpected status {status}")]
    UnexpectedStatus {
        /// HTTP status code returned by the server.
        status: u16,
    },
}

impl From<reqwest::Error> for HttpError {
    fn from(source: reqwest::Error) -> Self {
        Self::Transport { source }
    }
}
