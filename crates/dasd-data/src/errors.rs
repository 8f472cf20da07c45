//! Error-row repositories for both owning entities. One `(owner, kind)` pair
//! upserts atomically, growing its retry delay in the same statement that
//! records the new occurrence — no read-modify-write race between workers
//! reporting the same failure kind concurrently (§4.9).

use chrono::{DateTime, Utc};
use dasd_core::entity::{ErrorRecord, INITIAL_RETRY_DELAY_SECS, MAX_RETRY_DELAY_SECS};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{DataError, DataResult};
use crate::pool::Store;

#[derive(Debug, Clone, FromRow)]
struct ErrorRow {
    owner_id: Uuid,
    kind: String,
    message: String,
    time: DateTime<Utc>,
    stage: String,
    count: i64,
    retry_delay_secs: i64,
}

impl From<ErrorRow> for ErrorRecord {
    fn from(row: ErrorRow) -> Self {
        Self {
            owner_id: row.owner_id,
            kind: row.kind,
            message: row.message,
            time: row.time,
            stage: row.stage,
            count: row.count,
            retry_delay_secs: row.retry_delay_secs,
        }
    }
}

const UPSERT_TORRENT_ERROR: &str = r"
    INSERT INTO torrent_errors (torrent_id, kind, message, stage, time, count, retry_delay_secs)
    VALUES ($1, $2, $3, $4, now(), 1, $5)
    ON CONFLICT (torrent_id, kind) DO UPDATE
    SET message = excluded.message,
        stage = excluded.stage,
        time = excluded.time,
        count = torrent_errors.count + 1,
        retry_delay_secs = LEAST(torrent_errors.retry_delay_secs * torrent_errors.retry_delay_secs, $6)
    RETURNING torrent_id AS owner_id, kind, message, time, stage, count, retry_delay_secs
";

const LATEST_TORRENT_ERROR: &str = r"
    SELECT torrent_id AS owner_id, kind, message, time, stage, count, retry_delay_secs
    FROM torrent_errors
    WHERE torrent_id = $1
    ORDER BY time DESC
    LIMIT 1
";

const UPSERT_PACKAGE_FILE_ERROR: &str = r"
    INSERT INTO package_file_errors (package_file_id, kind, message, stage, time, count, retry_delay_secs)
    VALUES ($1, $2, $3, $4, now(), 1, $5)
    ON CONFLICT (package_file_id, kind) DO UPDATE
    SET message = excluded.message,
        stage = excluded.stage,
        time = excluded.time,
        count = package_file_errors.count + 1,
        retry_delay_secs = LEAST(package_file_errors.retry_delay_secs * package_file_errors.retry_delay_secs, $6)
    RETURNING package_file_id AS owner_id, kind, message, time, stage, count, retry_delay_secs
";

const LATEST_PACKAGE_FILE_ERROR: &str = r"
    SELECT package_file_id AS owner_id, kind, message, time, stage, count, retry_delay_secs
    FROM package_file_errors
    WHERE package_file_id = $1
    ORDER BY time DESC
    LIMIT 1
";

impl Store {
    /// Record a torrent-level failure, growing the `(torrent, kind)` retry
    /// delay if one is already on file.
    pub async fn upsert_torrent_error(
        &self,
        torrent_id: Uuid,
        kind: &str,
        message: &str,
        stage: &str,
    ) -> DataResult<ErrorRecord> {
        sqlx::query_as::<_, ErrorRow>(UPSERT_TORRENT_ERROR)
            .bind(torrent_id)
            .bind(kind)
            .bind(message)
            .bind(stage)
            .bind(INITIAL_RETRY_DELAY_SECS)
            .bind(MAX_RETRY_DELAY_SECS)
            .fetch_one(&self.pool)
            .await
            .map(ErrorRecord::from)
            .map_err(|source| DataError::query("upsert_torrent_error", source))
            .inspect(|record| {
                tracing::warn!(
                    torrent_id = %torrent_id,
                    kind,
                    count = record.count,
                    retry_delay_secs = record.retry_delay_secs,
                    "torrent error recorded"
                );
            })
    }

    /// The most recent error recorded for a torrent, across all kinds.
    pub async fn latest_torrent_error(&self, torrent_id: Uuid) -> DataResult<Option<ErrorRecord>> {
        sqlx::query_as::<_, ErrorRow>(LATEST_TORRENT_ERROR)
            .bind(torrent_id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(ErrorRecord::from))
            .map_err(|source| DataError::query("latest_torrent_error", source))
    }

    /// Record a package-file-level failure, growing the `(package_file,
    /// kind)` retry delay if one is already on file.
    pub async fn upsert_package_file_error(
        &self,
        package_file_id: Uuid,
        kind: &str,
        message: &str,
        stage: &str,
    ) -> DataResult<ErrorRecord> {
        sqlx::query_as::<_, ErrorRow>(UPSERT_PACKAGE_FILE_ERROR)
            .bind(package_file_id)
            .bind(kind)
            .bind(message)
            .bind(stage)
            .bind(INITIAL_RETRY_DELAY_SECS)
            .bind(MAX_RETRY_DELAY_SECS)
            .fetch_one(&self.pool)
            .await
            .map(ErrorRecord::from)
            .map_err(|source| DataError::query("upsert_package_file_error", source))
            .inspect(|record| {
                tracing::warn!(
                    package_file_id = %package_file_id,
                    kind,
                    count = record.count,
                    retry_delay_secs = record.retry_delay_secs,
                    "package file error recorded"
                );
            })
    }

    /// The most recent error recorded for a package file, across all kinds.
    pub async fn latest_package_file_error(
        &self,
        package_file_id: Uuid,
    ) -> DataResult<Option<ErrorRecord>> {
        sqlx::query_as::<_, ErrorRow>(LATEST_PACKAGE_FILE_ERROR)
            .bind(package_file_id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(ErrorRecord::from))
            .map_err(|source| DataError::query("latest_package_file_error", source))
    }
}
