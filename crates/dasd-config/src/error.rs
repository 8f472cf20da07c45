//! # Design
//!
//! - One error type for both parsing and semantic validation.
//! - Carry enough context (section, field) that a misconfigured deployment
//!   can be fixed from the error message alone.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading or validating a layered configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The base config file could not be read.
    #[error("failed to read config file {path}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The base config file is not valid TOML.
    #[error("failed to parse config file {path}")]
    Parse {
        /// Path that failed to parse.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A required section or key was absent after file and env layering.
    #[error("missing config value: [{section}] {key}")]
    Missing {
        /// Section name.
        section: &'static str,
        /// Key name within the section.
        key: &'static str,
    },
    /// A value was present but failed to parse into its target type.
    #[error("invalid config value [{section}] {key} = {value:?}: {reason}")]
    InvalidValue {
        /// Section name.
        section: &'static str,
        /// Key name within the section.
        key: &'static str,
        /// Raw value that failed to parse.
        value: String,
        /// Description of the violation.
        reason: String,
    },
    /// A `path,owner,group,dmode,fmode` line in `[path_manager]` was malformed.
    #[error("invalid path_manager entry {key}")]
    PathSpec {
        /// Key within `[path_manager]` (e.g. `master`).
        key: &'static str,
        /// Underlying parse failure.
        source: dasd_fsops::FsOpsError,
    },
    /// A configured directory's parent does not exist on disk.
    #[error("path_manager.{key} parent directory does not exist: {parent}")]
    ParentMissing {
        /// Key within `[path_manager]`.
        key: &'static str,
        /// Missing parent directory.
        parent: PathBuf,
    },
    /// A user or group referenced by `[path_manager]` has no passwd/group entry.
    #[error("path_manager.{key} references an unknown user or group")]
    UnknownIdentity {
        /// Key within `[path_manager]`.
        key: &'static str,
        /// Underlying lookup failure.
        source: dasd_fsops::FsOpsError,
    },
    /// A configured URL failed to parse.
    #[error("invalid URL [{section}] {key} = {value:?}")]
    InvalidUrl {
        /// Section name.
        section: &'static str,
        /// Key name within the section.
        key: &'static str,
        /// Raw value that failed to parse.
        value: String,
        /// Underlying URL parse failure.
        source: url::ParseError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_carries_source() {
        let err = ConfigError::InvalidUrl {
            section: "http_client",
            key: "base_url",
            value: "not a url".to_string(),
            source: url::Url::parse("not a url").unwrap_err(),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("base_url"));
    }
}
