//! Shared error taxonomy for the packaging/shipping pipeline (SPEC_FULL.md
//! §7). Each crate boundary defines its own `thiserror` enum; this one
//! covers the pipeline-level failure kinds that the dispatcher and stage
//! workers reason about when deciding whether to `set_error` or crash.

use thiserror::Error;
use uuid::Uuid;

/// A failure kind attributable to a single entity (Torrent or PackageFile),
/// recorded via `set_error` and retried by the error handler.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A network request to the producer failed transiently (timeout,
    /// connection refused, 5xx, malformed JSON body).
    #[error("request to producer failed: {message}")]
    Request {
        /// Description of the failure.
        message: String,
    },
    /// The producer rejected the request's credentials.
    #[error("producer authorization rejected")]
    Unauthorized,
    /// Downloaded content failed size or checksum verification.
    #[error("content integrity check failed for {filename}")]
    Integrity {
        /// The package filename that failed verification.
        filename: String,
    },
    /// A filesystem ownership/permission operation failed.
    #[error("path operation failed: {message}")]
    Path {
        /// Description of the failure.
        message: String,
    },
    /// An expected resource was not found upstream.
    #[error("expected resource not found: {what}")]
    NotFound {
        /// Description of the missing resource.
        what: String,
    },
    /// A persistence query issued from within a worker's own `work()` call
    /// failed (distinct from the dispatcher/retry-scheduler's own
    /// `RuntimeError::Data`, which is never attributed to a single entity).
    #[error("persistence operation failed: {message}")]
    Storage {
        /// Description of the failure.
        message: String,
    },
}

impl PipelineError {
    /// A stable, compact discriminator used as the `(owner, kind)` upsert
    /// key for error records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Request { .. } => "request",
            Self::Unauthorized => "unauthorized",
            Self::Integrity { .. } => "integrity",
            Self::Path { .. } => "path",
            Self::NotFound { .. } => "not_found",
            Self::Storage { .. } => "storage",
        }
    }
}

/// A programmer/configuration error: invalid stage list, malformed
/// configuration discovered after startup validation should have caught
/// it, and similar. These are fatal per SPEC_FULL.md §7 and are not routed
/// through `set_error`.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The stage list configuration is invalid.
    #[error("invalid stage configuration: {message}")]
    InvalidStageList {
        /// Description of the violation.
        message: String,
    },
    /// An entity referenced an id that does not exist in the database.
    #[error("entity not found: {id}")]
    MissingEntity {
        /// The missing entity's id.
        id: Uuid,
    },
}
