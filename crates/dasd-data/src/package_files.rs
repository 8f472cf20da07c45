//! PackageFile repository, mirroring `torrents.rs`'s shape for the
//! chunk-level rows (§4.10).

use dasd_core::entity::PackageFile;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{DataError, DataResult};
use crate::pool::Store;

#[derive(Debug, Clone, FromRow)]
struct PackageFileRow {
    id: Uuid,
    torrent_id: Uuid,
    filename: String,
    filesize: Option<i64>,
    sha256: Option<String>,
    stage: String,
}

impl From<PackageFileRow> for PackageFile {
    fn from(row: PackageFileRow) -> Self {
        Self {
            id: row.id,
            torrent_id: row.torrent_id,
            filename: row.filename,
            filesize: row.filesize,
            sha256: row.sha256,
            stage: row.stage,
        }
    }
}

/// One chunk as reported by the producer's package/list endpoint, before it
/// has a database row. The legacy fallback (§9) leaves `filesize`/`sha256`
/// unset when the producer only returned a bare filename.
#[derive(Debug, Clone)]
pub struct PackageFileDraft {
    /// Chunk filename.
    pub filename: String,
    /// Chunk size in bytes, if the producer reported it.
    pub filesize: Option<i64>,
    /// Lowercase hex SHA-256, if the producer reported it.
    pub sha256: Option<String>,
}

const INSERT_PACKAGE_FILE: &str = r"
    INSERT INTO package_files (torrent_id, filename, filesize, sha256, stage)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, torrent_id, filename, filesize, sha256, stage
";

const SELECT_READY: &str = r"
    SELECT id, torrent_id, filename, filesize, sha256, stage
    FROM package_files
    WHERE stage = $1
    ORDER BY filename ASC
";

const UPDATE_STAGE: &str = r"
    UPDATE package_files
    SET stage = $2
    WHERE id = $1
";

const SELECT_BY_TORRENT: &str = r"
    SELECT id, torrent_id, filename, filesize, sha256, stage
    FROM package_files
    WHERE torrent_id = $1
    ORDER BY filename ASC
";

const COUNT_IN_STAGE: &str = r"
    SELECT count(*)
    FROM package_files
    WHERE torrent_id = $1 AND stage = $2
";

const DELETE_BY_TORRENT: &str = r"DELETE FROM package_files WHERE torrent_id = $1";

impl Store {
    /// Insert one package file row at `initial_stage` for `torrent_id`.
    pub async fn create_package_file(
        &self,
        torrent_id: Uuid,
        draft: &PackageFileDraft,
        initial_stage: &str,
    ) -> DataResult<PackageFile> {
        sqlx::query_as::<_, PackageFileRow>(INSERT_PACKAGE_FILE)
            .bind(torrent_id)
            .bind(&draft.filename)
            .bind(draft.filesize)
            .bind(&draft.sha256)
            .bind(initial_stage)
            .fetch_one(&self.pool)
            .await
            .map(PackageFile::from)
            .map_err(|source| DataError::query("create_package_file", source))
    }

    /// Insert every chunk reported by the packager/lister in one round of
    /// queries, returning the created rows in the same order as `drafts`.
    pub async fn create_package_files(
        &self,
        torrent_id: Uuid,
        drafts: &[PackageFileDraft],
        initial_stage: &str,
    ) -> DataResult<Vec<PackageFile>> {
        let mut created = Vec::with_capacity(drafts.len());
        for draft in drafts {
            created.push(
                self.create_package_file(torrent_id, draft, initial_stage)
                    .await?,
            );
        }
        Ok(created)
    }

    /// All package files currently sitting at `stage`, in filename order.
    pub async fn fetch_ready_package_files(&self, stage: &str) -> DataResult<Vec<PackageFile>> {
        sqlx::query_as::<_, PackageFileRow>(SELECT_READY)
            .bind(stage)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(PackageFile::from).collect())
            .map_err(|source| DataError::query("fetch_ready_package_files", source))
    }

    /// Move `id` to `stage`.
    pub async fn advance_package_file_stage(&self, id: Uuid, stage: &str) -> DataResult<()> {
        let result = sqlx::query(UPDATE_STAGE)
            .bind(id)
            .bind(stage)
            .execute(&self.pool)
            .await
            .map_err(|source| DataError::query("advance_package_file_stage", source))?;

        if result.rows_affected() == 0 {
            return Err(DataError::NotFound {
                entity: "package_file",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// All package files owned by `torrent_id`, in ascending filename order
    /// (the order the extractor joins chunks in, per §5/§4.8).
    pub async fn fetch_by_torrent(&self, torrent_id: Uuid) -> DataResult<Vec<PackageFile>> {
        sqlx::query_as::<_, PackageFileRow>(SELECT_BY_TORRENT)
            .bind(torrent_id)
            .fetch_all(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(PackageFile::from).collect())
            .map_err(|source| DataError::query("fetch_package_files_by_torrent", source))
    }

    /// Count of `torrent_id`'s package files currently at `stage`, used by
    /// the downloader's torrent-stage aggregation query.
    pub async fn count_in_stage(&self, torrent_id: Uuid, stage: &str) -> DataResult<i64> {
        sqlx::query_scalar(COUNT_IN_STAGE)
            .bind(torrent_id)
            .bind(stage)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| DataError::query("count_package_files_in_stage", source))
    }

    /// Delete every package file owned by `torrent_id`, used by the
    /// lister's orphan-row cleanup.
    pub async fn delete_package_files_by_torrent(&self, torrent_id: Uuid) -> DataResult<()> {
        sqlx::query(DELETE_BY_TORRENT)
            .bind(torrent_id)
            .execute(&self.pool)
            .await
            .map_err(|source| DataError::query("delete_package_files_by_torrent", source))?;
        Ok(())
    }
}
