//! # Design
//!
//! - Provide structured, constant-message errors for the packaging pipeline.
//! - Capture operation context (paths, fields) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem/packaging operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by the packaging engine and path manager.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// The torrent source path does not exist.
    #[error("torrent source does not exist: {path}")]
    TorrentDoesNotExist {
        /// Missing source path.
        path: PathBuf,
    },
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Walkdir traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Tar archive failures.
    #[error("fsops archive failure")]
    Archive {
        /// Operation that triggered the archive failure.
        operation: &'static str,
        /// Path involved in the archive failure.
        path: PathBuf,
        /// Underlying IO error from the tar crate.
        source: io::Error,
    },
    /// The emitted chunk count would exceed `max_package_files`.
    #[error("packaging would emit more than {max_package_files} chunks")]
    TooManyChunks {
        /// Configured safety cap.
        max_package_files: u32,
    },
    /// User lookup failed when applying ownership changes.
    #[error("fsops user lookup failed: {user}")]
    UserLookup {
        /// Username that failed lookup.
        user: String,
        /// Underlying nix error.
        source: nix::Error,
    },
    /// Group lookup failed when applying ownership changes.
    #[error("fsops group lookup failed: {group}")]
    GroupLookup {
        /// Group name that failed lookup.
        group: String,
        /// Underlying nix error.
        source: nix::Error,
    },
    /// Nix syscall failures (chown/chmod).
    #[error("fsops nix failure")]
    Nix {
        /// Operation that triggered the nix failure.
        operation: &'static str,
        /// Path involved in the nix failure.
        path: PathBuf,
        /// Underlying nix error.
        source: nix::Error,
    },
    /// A path-spec config line (`path,owner,group,dmode,fmode`) was malformed.
    #[error("invalid path spec: {reason}")]
    InvalidPathSpec {
        /// Description of the violation.
        reason: String,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Archive {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn fsops_error_helpers_build_variants() {
        let io_err = FsOpsError::io("read", "path", io::Error::other("io"));
        assert!(matches!(io_err, FsOpsError::Io { .. }));
        assert!(io_err.source().is_some());

        let archive_err = FsOpsError::archive("write", "archive.tar", io::Error::other("tar"));
        assert!(matches!(archive_err, FsOpsError::Archive { .. }));
        assert!(archive_err.source().is_some());
    }
}
