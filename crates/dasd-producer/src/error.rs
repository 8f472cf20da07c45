//! HTTP error responses (SPEC_FULL.md §6/§7), grounded on the teacher's
//! `ApiError`/`IntoResponse` idiom, trimmed to the problem shapes this
//! surface actually needs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dasd_api_models::ProblemDetails;

/// Result alias for handlers in this crate.
pub type ApiResult<T> = Result<T, ApiError>;

/// A problem response: HTTP status plus the RFC 9457 body served for it.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    title: &'static str,
    detail: Option<String>,
}

impl ApiError {
    /// Build an error with no further detail.
    #[must_use]
    pub const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
        }
    }

    /// Attach a detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Missing/incorrect credentials on an authenticated endpoint.
    #[must_use]
    pub const fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Authentication required")
    }

    /// The named torrent or download file does not exist (or, for
    /// `GET /torrents/`, exists but isn't packaged yet).
    #[must_use]
    pub const fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not-found", "Resource not found")
    }

    /// A malformed request body or header.
    #[must_use]
    pub const fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad-request", "Malformed request")
    }

    /// Packaging or another internal operation failed.
    #[must_use]
    pub const fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", "Internal error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<dasd_data::DataError> for ApiError {
    fn from(source: dasd_data::DataError) -> Self {
        match source {
            dasd_data::DataError::NotFound { .. } => Self::not_found(),
            other => Self::internal().with_detail(other.to_string()),
        }
    }
}

impl From<dasd_fsops::FsOpsError> for ApiError {
    fn from(source: dasd_fsops::FsOpsError) -> Self {
        match source {
            dasd_fsops::FsOpsError::TorrentDoesNotExist { .. } => Self::not_found(),
            other => Self::internal().with_detail(other.to_string()),
        }
    }
}
