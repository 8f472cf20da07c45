//! Torrent repository: the narrow set of queries the dispatcher and stage
//! workers actually need (§4.10).

use chrono::{DateTime, Utc};
use dasd_core::entity::Torrent;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{DataError, DataResult};
use crate::pool::Store;

#[derive(Debug, Clone, FromRow)]
struct TorrentRow {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    last_modified_at: DateTime<Utc>,
    stage: String,
    package_files_count: i64,
}

impl From<TorrentRow> for Torrent {
    fn from(row: TorrentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            last_modified_at: row.last_modified_at,
            stage: row.stage,
            package_files_count: row.package_files_count,
        }
    }
}

const INSERT_TORRENT: &str = r"
    INSERT INTO torrents (name, stage)
    VALUES ($1, $2)
    RETURNING id, name, created_at, last_modified_at, stage, package_files_count
";

const SELECT_READY: &str = r"
    SELECT id, name, created_at, last_modified_at, stage, package_files_count
    FROM torrents
    WHERE stage = $1
    ORDER BY created_at ASC
";

const UPDATE_STAGE: &str = r"
    UPDATE torrents
    SET stage = $2, last_modified_at = $3
    WHERE id = $1
";

const UPDATE_PACKAGE_FILES_COUNT: &str = r"
    UPDATE torrents
    SET package_files_count = $2, last_modified_at = $3
    WHERE id = $1
";

const SELECT_BY_NAME: &str = r"
    SELECT id, name, created_at, last_modified_at, stage, package_files_count
    FROM torrents
    WHERE name = $1
";

const SELECT_BY_ID: &str = r"
    SELECT id, name, created_at, last_modified_at, stage, package_files_count
    FROM torrents
    WHERE id = $1
";

const SELECT_ALL_NAMES: &str = r"SELECT name FROM torrents";

const SELECT_EMPTY_AT_STAGE: &str = r"
    SELECT id, name, created_at, last_modified_at, stage, package_files_count
    FROM torrents
    WHERE stage = $1 AND package_files_count = 0
    ORDER BY created_at ASC
";

const DELETE_TORRENT: &str = r"DELETE FROM torrents WHERE id = $1";

impl Store {
    /// Insert a new torrent at `initial_stage`, returning the created row.
    ///
    /// `initial_stage` is caller-supplied rather than hardcoded here: the
    /// directory monitor hands freshly discovered torrents straight to the
    /// packager's channel at `Packaging` (see DESIGN.md's open question
    /// resolution on the initial Torrent stage), while other callers may
    /// need a different starting point.
    pub async fn create_torrent(&self, name: &str, initial_stage: &str) -> DataResult<Torrent> {
        sqlx::query_as::<_, TorrentRow>(INSERT_TORRENT)
            .bind(name)
            .bind(initial_stage)
            .fetch_one(&self.pool)
            .await
            .map(Torrent::from)
            .map_err(|source| DataError::query("create_torrent", source))
    }

    /// All torrents currently sitting at `stage`, oldest first (`created_at
    /// ASC`, per §6).
    pub async fn fetch_ready_torrents(&self, stage: &str) -> DataResult<Vec<Torrent>> {
        sqlx::query_as::<_, TorrentRow>(SELECT_READY)
            .bind(stage)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Torrent::from).collect())
            .map_err(|source| DataError::query("fetch_ready_torrents", source))
    }

    /// Move `id` to `stage`, bumping `last_modified_at`.
    pub async fn advance_torrent_stage(&self, id: Uuid, stage: &str) -> DataResult<()> {
        let result = sqlx::query(UPDATE_STAGE)
            .bind(id)
            .bind(stage)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|source| DataError::query("advance_torrent_stage", source))?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound {
                entity: "torrent",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Record the number of package files a torrent owns, as determined by
    /// the packager/lister after creating the `PackageFile` rows.
    pub async fn set_package_files_count(&self, id: Uuid, count: i64) -> DataResult<()> {
        sqlx::query(UPDATE_PACKAGE_FILES_COUNT)
            .bind(id)
            .bind(count)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|source| DataError::query("set_package_files_count", source))?;
        Ok(())
    }

    /// Fetch a torrent by its unique name, used by the completed-torrent
    /// monitor to avoid re-creating an already-known entry.
    pub async fn fetch_by_name(&self, name: &str) -> DataResult<Option<Torrent>> {
        sqlx::query_as::<_, TorrentRow>(SELECT_BY_NAME)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Torrent::from))
            .map_err(|source| DataError::query("fetch_torrent_by_name", source))
    }

    /// Fetch a torrent by its primary key, used by stage workers that only
    /// hold a `torrent_id` foreign key (e.g. the package downloader).
    pub async fn fetch_torrent(&self, id: Uuid) -> DataResult<Option<Torrent>> {
        sqlx::query_as::<_, TorrentRow>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(Torrent::from))
            .map_err(|source| DataError::query("fetch_torrent", source))
    }

    /// All known torrent names, used to rehydrate the completed-torrent
    /// monitor's in-memory set on startup.
    pub async fn all_names(&self) -> DataResult<Vec<String>> {
        sqlx::query_scalar(SELECT_ALL_NAMES)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| DataError::query("all_torrent_names", source))
    }

    /// Torrents stuck at `stage` with zero package files: the lister's
    /// orphan-cleanup one-time query target.
    pub async fn fetch_empty_at(&self, stage: &str) -> DataResult<Vec<Torrent>> {
        sqlx::query_as::<_, TorrentRow>(SELECT_EMPTY_AT_STAGE)
            .bind(stage)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Torrent::from).collect())
            .map_err(|source| DataError::query("fetch_empty_torrents", source))
    }

    /// Remove a torrent and (via `ON DELETE CASCADE`) its package files and
    /// error rows.
    pub async fn delete_torrent(&self, id: Uuid) -> DataResult<()> {
        sqlx::query(DELETE_TORRENT)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|source| DataError::query("delete_torrent", source))?;
        Ok(())
    }
}
