//! Consumes package files at `Added`, streams the packaged chunk from the
//! producer's flat `download/<filename>/` endpoint, verifies it against the
//! expected size/checksum when known, and advances to `Downloaded`. Grounded
//! on `daserver/dasdaemon/workers/package_downloader.py`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_core::{PackageFile, PipelineError};
use dasd_data::Store;
use dasd_fsops::{sha256_hex, PathManager};
use dasd_http::Client;
use dasd_runtime::{ConsumerHandle, OneTimeQueryFunction, Outcome, PeriodicQueryFunction, RuntimeResult, WorkError, Worker};
use tokio_stream::StreamExt;
use tokio_util::io::StreamReader;

use super::{package_file_failure, request_error, storage_error};

/// The stage this worker consumes from.
pub const READY_STAGE: &str = "Added";
/// The stage this worker advances package files to once the download
/// completes and verifies.
pub const TARGET_STAGE: &str = "Downloaded";

/// Queue consumer: downloads one packaged chunk, resuming from its local
/// size if the file already partially exists.
pub struct PackageDownloader {
    store: Arc<Store>,
    client: Arc<Client>,
    path_manager: Arc<PathManager>,
    handle: ConsumerHandle<PackageFile>,
}

impl PackageDownloader {
    /// Build the worker around an already-registered consumer handle.
    #[must_use]
    pub const fn new(
        store: Arc<Store>,
        client: Arc<Client>,
        path_manager: Arc<PathManager>,
        handle: ConsumerHandle<PackageFile>,
    ) -> Self {
        Self {
            store,
            client,
            path_manager,
            handle,
        }
    }

    fn path_error(package_file: &PackageFile, message: impl std::fmt::Display) -> WorkError {
        package_file_failure(package_file.id, READY_STAGE, PipelineError::Path { message: message.to_string() })
    }

    async fn owning_torrent_name(&self, package_file: &PackageFile) -> Result<String, WorkError> {
        let torrent = self
            .store
            .fetch_torrent(package_file.torrent_id)
            .await
            .map_err(|source| package_file_failure(package_file.id, READY_STAGE, storage_error(&source)))?
            .ok_or_else(|| {
                package_file_failure(
                    package_file.id,
                    READY_STAGE,
                    PipelineError::NotFound {
                        what: format!("torrent {}", package_file.torrent_id),
                    },
                )
            })?;
        Ok(torrent.name)
    }

    /// Verify the downloaded file's size and checksum against the expected
    /// values, when the producer reported them. Legacy producers that only
    /// report a bare filename leave both `None`, in which case verification
    /// is skipped.
    async fn verify(package_file: &PackageFile, path: &std::path::Path) -> Result<bool, WorkError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| Self::path_error(package_file, source))?;

        if let Some(expected_size) = package_file.filesize {
            if bytes.len() as i64 != expected_size {
                return Ok(false);
            }
        }
        if let Some(expected_sha256) = &package_file.sha256 {
            if &sha256_hex(&bytes) != expected_sha256 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl Worker for PackageDownloader {
    fn name(&self) -> &'static str {
        "package_downloader"
    }

    async fn work(&self) -> Result<Outcome, WorkError> {
        let Some(package_file) = self.handle.recv().await else {
            return Ok(Outcome::Stopped);
        };

        let torrent_name = self.owning_torrent_name(&package_file).await?;

        let dir = self
            .path_manager
            .create_package_files_dir(&torrent_name)
            .map_err(|source| Self::path_error(&package_file, source))?;
        let local_path = dir.join(&package_file.filename);

        let resume_at = tokio::fs::metadata(&local_path)
            .await
            .map(|metadata| metadata.len())
            .unwrap_or(0);

        let download_path = format!("download/{}/", package_file.filename);
        let response = self
            .client
            .get_file_stream(&download_path, resume_at, None)
            .await
            .map_err(|source| package_file_failure(package_file.id, READY_STAGE, request_error(&source)))?;

        let byte_stream = response.bytes_stream().map(|result| result.map_err(std::io::Error::other));
        let mut reader = StreamReader::new(byte_stream);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&local_path)
            .await
            .map_err(|source| Self::path_error(&package_file, source))?;
        tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|source| Self::path_error(&package_file, source))?;

        if !Self::verify(&package_file, &local_path).await? {
            let _ = tokio::fs::remove_file(&local_path).await;
            return Err(package_file_failure(
                package_file.id,
                READY_STAGE,
                PipelineError::Integrity {
                    filename: package_file.filename.clone(),
                },
            ));
        }

        self.store
            .advance_package_file_stage(package_file.id, TARGET_STAGE)
            .await
            .map_err(|source| package_file_failure(package_file.id, READY_STAGE, storage_error(&source)))?;

        Ok(Outcome::Continue)
    }

    fn sleep_duration(&self) -> Duration {
        Duration::ZERO
    }
}

/// One-time startup query: package files stuck at `Downloading` indicate an
/// interrupted download from a prior process. Reset them to `Added` so the
/// dispatcher re-delivers them.
pub struct PackageDownloaderRecoveryQuery;

#[async_trait]
impl OneTimeQueryFunction for PackageDownloaderRecoveryQuery {
    async fn run(&self, store: &Store) -> RuntimeResult<()> {
        for package_file in store.fetch_ready_package_files("Downloading").await? {
            store.advance_package_file_stage(package_file.id, READY_STAGE).await?;
        }
        Ok(())
    }
}

/// Periodic query: rolls a torrent's own stage forward as its package files
/// individually progress through `Downloading`/`Downloaded`.
pub struct TorrentAggregationQuery;

#[async_trait]
impl PeriodicQueryFunction for TorrentAggregationQuery {
    async fn run(&self, store: &Store) -> RuntimeResult<()> {
        for torrent in store.fetch_ready_torrents("Listed").await? {
            if store.count_in_stage(torrent.id, "Downloading").await? > 0 {
                store.advance_torrent_stage(torrent.id, "Downloading").await?;
            }
        }
        for torrent in store.fetch_ready_torrents("Downloading").await? {
            if torrent.package_files_count > 0
                && store.count_in_stage(torrent.id, TARGET_STAGE).await? == torrent.package_files_count
            {
                store.advance_torrent_stage(torrent.id, TARGET_STAGE).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_mismatch_fails_verification() {
        let package_file = PackageFile {
            id: uuid::Uuid::new_v4(),
            torrent_id: uuid::Uuid::new_v4(),
            filename: "chunk.tar.0000".to_string(),
            filesize: Some(4),
            sha256: None,
            stage: "Downloading".to_string(),
        };
        assert_ne!(b"hello".len() as i64, package_file.filesize.unwrap());
    }

    #[test]
    fn checksum_matches_known_content() {
        assert_eq!(sha256_hex(b"hello").len(), 64);
    }
}
