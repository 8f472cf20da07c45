//! Consumes torrents sitting at `Packaging` (the self-loop `ConsumerKey`
//! `("Packaging", "Packaging")`), asks the producer to package them, and
//! creates the resulting `PackageFile` rows before advancing to `Packaged`.
//! Grounded on `daserver/dasdaemon/workers/completed_torrent_packager.py`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_api_models::{PackageFileListing, TorrentNameRequest};
use dasd_core::Torrent;
use dasd_data::{PackageFileDraft, Store};
use dasd_http::Client;
use dasd_runtime::{ConsumerHandle, Outcome, WorkError, Worker};

use super::{request_error, storage_error, torrent_failure};

/// The stage this worker consumes from: also its own target, since
/// `Packaging` has no resting predecessor to read from.
pub const READY_STAGE: &str = "Packaging";
/// The stage this worker advances torrents to once packaging succeeds.
pub const TARGET_STAGE: &str = "Packaged";
/// Initial stage for the `PackageFile` rows this worker creates.
pub const PACKAGE_FILE_INITIAL_STAGE: &str = "Added";

/// Queue consumer: asks the producer to package a torrent, records the
/// package files it reports, and advances the torrent to `Packaged`.
pub struct CompletedTorrentPackager {
    store: Arc<Store>,
    client: Arc<Client>,
    handle: ConsumerHandle<Torrent>,
}

impl CompletedTorrentPackager {
    /// Build the worker around an already-registered consumer handle.
    #[must_use]
    pub const fn new(store: Arc<Store>, client: Arc<Client>, handle: ConsumerHandle<Torrent>) -> Self {
        Self { store, client, handle }
    }
}

#[async_trait]
impl Worker for CompletedTorrentPackager {
    fn name(&self) -> &'static str {
        "completed_torrent_packager"
    }

    async fn work(&self) -> Result<Outcome, WorkError> {
        let Some(torrent) = self.handle.recv().await else {
            return Ok(Outcome::Stopped);
        };

        let listing: PackageFileListing = self
            .client
            .post_json("torrents/", &TorrentNameRequest { torrent: torrent.name.clone() })
            .await
            .map_err(|source| torrent_failure(torrent.id, READY_STAGE, request_error(&source)))?;

        let drafts: Vec<PackageFileDraft> = listing
            .0
            .into_iter()
            .map(|dto| PackageFileDraft {
                filename: dto.filename,
                filesize: dto.filesize,
                sha256: dto.sha256,
            })
            .collect();
        let count = drafts.len();

        self.store
            .create_package_files(torrent.id, &drafts, PACKAGE_FILE_INITIAL_STAGE)
            .await
            .map_err(|source| torrent_failure(torrent.id, READY_STAGE, storage_error(&source)))?;
        self.store
            .set_package_files_count(torrent.id, i64::try_from(count).unwrap_or(i64::MAX))
            .await
            .map_err(|source| torrent_failure(torrent.id, READY_STAGE, storage_error(&source)))?;
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
    fn packages_into_the_packaged_stage() {
        assert_eq!(READY_STAGE, "Packaging");
        assert_eq!(TARGET_STAGE, "Packaged");
    }
}
