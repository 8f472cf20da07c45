//! Error type for the dispatcher/worker-pool engine.

use thiserror::Error;

/// Result alias for this crate's operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by the dispatcher, worker groups, and the retry scheduler.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A persistence operation failed.
    #[error("persistence operation failed")]
    Data {
        /// Underlying data-layer error.
        #[source]
        source: dasd_data::DataError,
    },
    /// A stage name failed to resolve against its `StageList`.
    #[error("stage navigation failed")]
    Stage {
        /// Underlying stage error.
        #[source]
        source: dasd_core::StageError,
    },
    /// A worker's `prepare` hook failed.
    #[error("worker group '{group}' failed to prepare: {message}")]
    Prepare {
        /// Name of the worker group that failed to prepare.
        group: &'static str,
        /// Description of the failure.
        message: String,
    },
}

impl From<dasd_data::DataError> for RuntimeError {
    fn from(source: dasd_data::DataError) -> Self {
        Self::Data { source }
    }
}

impl From<dasd_core::StageError> for RuntimeError {
    fn from(source: dasd_core::StageError) -> Self {
        Self::Stage { source }
    }
}
