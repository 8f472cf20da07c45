//! Error types for the data access layer.

use thiserror::Error;

/// Result alias for data layer operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors raised by the persistence layer.
#[derive(Debug, Error)]
pub enum DataError {
    /// Migration execution failed.
    #[error("migration failed")]
    MigrationFailed {
        /// Underlying migration error.
        #[source]
        source: sqlx::migrate::MigrateError,
    },
    /// A database operation failed.
    #[error("database operation failed: {operation}")]
    QueryFailed {
        /// Operation identifier, for diagnostics.
        operation: &'static str,
        /// Underlying SQL error.
        #[source]
        source: sqlx::Error,
    },
    /// The requested row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"torrent"`.
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },
}

impl DataError {
    pub(crate) fn query(operation: &'static str, source: sqlx::Error) -> Self {
        Self::QueryFailed { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn data_error_carries_source() {
        let query = DataError::query("fetch_ready", sqlx::Error::RowNotFound);
        assert!(query.source().is_some());
        assert_eq!(query.to_string(), "database operation failed: fetch_ready");

        let not_found = DataError::NotFound {
            entity: "torrent",
            id: "abc".to_string(),
        };
        assert!(not_found.source().is_none());
    }
}
