//! Shared domain entities, independent of their persistence representation.
//! `dasd-data` maps these to and from Postgres rows; workers operate on
//! these plain values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logical unit of content identified by a unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Torrent {
    /// Primary key.
    pub id: Uuid,
    /// Unique human label; also the on-disk directory/archive basename.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recent mutation.
    pub last_modified_at: DateTime<Utc>,
    /// Current stage name (one of `stage::TORRENT_STAGES`, or `Error`).
    pub stage: String,
    /// Number of `PackageFile` rows owned by this torrent.
    pub package_files_count: i64,
}

/// A fixed-size byte range of a torrent's tar archive, carrying its own
/// checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    /// Primary key.
    pub id: Uuid,
    /// Owning torrent.
    pub torrent_id: Uuid,
    /// Chunk filename, unique within the owning torrent.
    pub filename: String,
    /// Chunk size in bytes, if known (see legacy producer fallback).
    pub filesize: Option<i64>,
    /// Lowercase hex SHA-256, if known (see legacy producer fallback).
    pub sha256: Option<String>,
    /// Current stage name (one of `stage::PACKAGE_FILE_STAGES`, or `Error`).
    pub stage: String,
}

/// A stable identifier for an error kind, used as the upsert key alongside
/// the owning entity.
pub type ErrorKind = &'static str;

/// Common shape for the `TorrentError` / `PackageFileError` rows: message,
/// the stage at which the failure occurred, occurrence count, and the
/// exponentially growing retry delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Owning entity id (torrent or package file).
    pub owner_id: Uuid,
    /// Stable error-kind discriminator.
    pub kind: String,
    /// Human-readable message.
    pub message: String,
    /// Timestamp of the most recent occurrence.
    pub time: DateTime<Utc>,
    /// The stage the owner was in when the failure occurred.
    pub stage: String,
    /// Number of times this `(owner, kind)` pair has been recorded.
    pub count: i64,
    /// Seconds to wait, from `time`, before returning the owner to
    /// `previous_completed(stage)`. Clamped to `MAX_RETRY_DELAY_SECS`.
    pub retry_delay_secs: i64,
}

/// Starting retry delay, in seconds, for a brand-new `(owner, kind)` error.
pub const INITIAL_RETRY_DELAY_SECS: i64 = 2;

/// Upper bound for `retry_delay_secs`, preventing overflow from repeated
/// squaring (see SPEC_FULL.md §9).
pub const MAX_RETRY_DELAY_SECS: i64 = 24 * 60 * 60;

/// Apply the upsert-by-`(owner, kind)` retry growth rule to an existing
/// record: `count += 1`, `retry_delay = min(retry_delay^2, max)`, `time`
/// left for the caller to refresh.
#[must_use]
pub fn grow_retry_delay(previous_delay_secs: i64) -> i64 {
    previous_delay_secs
        .checked_mul(previous_delay_secs)
        .map_or(MAX_RETRY_DELAY_SECS, |squared| squared.min(MAX_RETRY_DELAY_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_follows_iterated_square_sequence() {
        let mut delay = INITIAL_RETRY_DELAY_SECS;
        let expected = [2, 4, 16, 256, 65536];
        for value in expected {
            assert_eq!(delay, value);
            delay = grow_retry_delay(delay);
        }
    }

    #[test]
    fn retry_delay_clamps_instead_of_overflowing() {
        let mut delay = INITIAL_RETRY_DELAY_SECS;
        for _ in 0..10 {
            delay = grow_retry_delay(delay);
        }
        assert_eq!(delay, MAX_RETRY_DELAY_SECS);
    }
}
