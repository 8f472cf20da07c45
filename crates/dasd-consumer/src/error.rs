//! # Design
//!
//! - Centralize application-level errors for bootstrap and the run loop.
//! - Keep error messages constant while carrying the source error for debugging.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type: every crate boundary the bootstrap path
/// touches, tagged with the operation that failed.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration failed to load or validate.
    #[error("loading configuration failed")]
    Config {
        /// Underlying configuration error.
        #[source]
        source: dasd_config::ConfigError,
    },
    /// Connecting to the persistence store, or a query issued during
    /// bootstrap, failed.
    #[error("persistence operation failed")]
    Data {
        /// Underlying data-layer error.
        #[source]
        source: dasd_data::DataError,
    },
    /// Building the producer HTTP client failed.
    #[error("building the producer client failed")]
    Http {
        /// Underlying HTTP client error.
        #[source]
        source: dasd_http::HttpError,
    },
    /// A filesystem/path-manager operation failed during bootstrap.
    #[error("filesystem operation failed")]
    FsOps {
        /// Underlying fsops error.
        #[source]
        source: dasd_fsops::FsOpsError,
    },
    /// The dispatcher/worker-pool runtime failed to start or run.
    #[error("runtime engine failed")]
    Runtime {
        /// Underlying runtime error.
        #[source]
        source: dasd_runtime::RuntimeError,
    },
}

impl From<dasd_config::ConfigError> for AppError {
    fn from(source: dasd_config::ConfigError) -> Self {
        Self::Config { source }
    }
}

impl From<dasd_data::DataError> for AppError {
    fn from(source: dasd_data::DataError) -> Self {
        Self::Data { source }
    }
}

impl From<dasd_http::HttpError> for AppError {
    fn from(source: dasd_http::HttpError) -> Self {
        Self::Http { source }
    }
}

impl From<dasd_fsops::FsOpsError> for AppError {
    fn from(source: dasd_fsops::FsOpsError) -> Self {
        Self::FsOps { source }
    }
}

impl From<dasd_runtime::RuntimeError> for AppError {
    fn from(source: dasd_runtime::RuntimeError) -> Self {
        Self::Runtime { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn app_error_wraps_and_preserves_source() {
        let data = dasd_data::DataError::NotFound {
            entity: "torrent",
            id: "abc".to_string(),
        };
        let app: AppError = data.into();
        assert!(matches!(app, AppError::Data { .. }));
        assert!(app.source().is_some());
    }
}
