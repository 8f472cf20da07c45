//! Consumes torrents at `Downloaded`, joins their chunk files back into an
//! archive, extracts it, normalizes ownership on the result, and advances
//! to `Extracted`. Grounded on
//! `daserver/dasdaemon/workers/package_extractor.py`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_core::{PipelineError, Torrent};
use dasd_data::Store;
use dasd_fsops::PathManager;
use dasd_runtime::{ConsumerHandle, Outcome, WorkError, Worker};

use super::{storage_error, torrent_failure};

/// The stage this worker consumes from.
pub const READY_STAGE: &str = "Downloaded";
/// The stage this worker advances torrents to once extraction succeeds.
pub const TARGET_STAGE: &str = "Extracted";

/// Queue consumer: joins a torrent's chunk files into an archive, extracts
/// it, and normalizes ownership on the extracted output.
pub struct PackageExtractor {
    store: Arc<Store>,
    path_manager: Arc<PathManager>,
    handle: ConsumerHandle<Torrent>,
}

impl PackageExtractor {
    /// Build the worker around an already-registered consumer handle.
    #[must_use]
    pub const fn new(store: Arc<Store>, path_manager: Arc<PathManager>, handle: ConsumerHandle<Torrent>) -> Self {
        Self { store, path_manager, handle }
    }

    fn path_error(torrent: &Torrent, message: impl std::fmt::Display) -> WorkError {
        torrent_failure(torrent.id, READY_STAGE, PipelineError::Path { message: message.to_string() })
    }
}

#[async_trait]
impl Worker for PackageExtractor {
    fn name(&self) -> &'static str {
        "package_extractor"
    }

    async fn work(&self) -> Result<Outcome, WorkError> {
        let Some(torrent) = self.handle.recv().await else {
            return Ok(Outcome::Stopped);
        };

        let package_files = self
            .store
            .fetch_by_torrent(torrent.id)
            .await
            .map_err(|source| torrent_failure(torrent.id, READY_STAGE, storage_error(&source)))?;
        let filenames: Vec<String> = package_files.into_iter().map(|file| file.filename).collect();

        let source_dir = self.path_manager.package_files_dir(&torrent.name);
        let archive_path = self.path_manager.package_archive_path(&torrent.name);
        dasd_fsops::join_files(&archive_path, &source_dir, &filenames).map_err(|source| Self::path_error(&torrent, source))?;

        let output_dir = self
            .path_manager
            .create_package_output_dir(&torrent.name)
            .map_err(|source| Self::path_error(&torrent, source))?;
        dasd_fsops::extract_archive(&archive_path, &output_dir).map_err(|source| Self::path_error(&torrent, source))?;

        self.path_manager
            .chownmod_package_output_dir(&torrent.name)
            .map_err(|source| Self::path_error(&torrent, source))?;
        self.path_manager
            .remove_package_files_dir(&torrent.name)
            .map_err(|source| Self::path_error(&torrent, source))?;

        self.store
            .advance_torrent_stage(torrent.id, TARGET_STAGE)
            .await
            .map_err(|source| torrent_failure(torrent.id, READY_STAGE, storage_error(&source)))?;

        Ok(Outcome::Continue)
    }

    fn sleep_duration(&self) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_downloaded_torrents_to_extracted() {
        assert_eq!(READY_STAGE, "Downloaded");
        assert_eq!(TARGET_STAGE, "Extracted");
    }
}
