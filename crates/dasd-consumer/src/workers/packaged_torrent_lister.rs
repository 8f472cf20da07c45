//! Consumes torrents at `Packaged` (fed both by `CompletedTorrentPackager`'s
//! ordinary stage advance and by `PackagedTorrentMonitor`'s direct
//! reconciliation insert), fetches the canonical chunk listing, and
//! advances to `Listed`. Grounded on
//! `daserver/dasdaemon/workers/packaged_torrent_lister.py`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_api_models::{PackageFileListing, TorrentNameRequest};
use dasd_core::Torrent;
use dasd_data::{PackageFileDraft, Store};
use dasd_http::Client;
use dasd_runtime::{ConsumerHandle, OneTimeQueryFunction, Outcome, RuntimeResult, WorkError, Worker};

use super::{request_error, storage_error, torrent_failure};

/// The stage this worker consumes from.
pub const READY_STAGE: &str = "Packaged";
/// The stage this worker advances torrents to once listing succeeds.
pub const TARGET_STAGE: &str = "Listed";
/// Initial stage for `PackageFile` rows created here.
pub const PACKAGE_FILE_INITIAL_STAGE: &str = "Added";

/// Queue consumer: fetches a torrent's chunk listing and ensures its
/// `PackageFile` rows exist before advancing it to `Listed`.
pub struct PackagedTorrentLister {
    store: Arc<Store>,
    client: Arc<Client>,
    handle: ConsumerHandle<Torrent>,
}

impl PackagedTorrentLister {
    /// Build the worker around an already-registered consumer handle.
    #[must_use]
    pub const fn new(store: Arc<Store>, client: Arc<Client>, handle: ConsumerHandle<Torrent>) -> Self {
        Self { store, client, handle }
    }
}

#[async_trait]
impl Worker for PackagedTorrentLister {
    fn name(&self) -> &'static str {
        "packaged_torrent_lister"
    }

    async fn work(&self) -> Result<Outcome, WorkError> {
        let Some(torrent) = self.handle.recv().await else {
            return Ok(Outcome::Stopped);
        };

        let listing: PackageFileListing = self
            .client
            .get_json_with_body("torrents/", &TorrentNameRequest { torrent: torrent.name.clone() })
            .await
            .map_err(|source| torrent_failure(torrent.id, READY_STAGE, request_error(&source)))?;

        if torrent.package_files_count == 0 {
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
        }

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

/// One-time startup query: torrents stuck at `Listing` with zero package
/// files indicate a crash mid-transition. Roll them back to `Packaged` so
/// the dispatcher's ordinary fanout re-delivers them to this worker.
pub struct ListerRecoveryQuery;

#[async_trait]
impl OneTimeQueryFunction for ListerRecoveryQuery {
    async fn run(&self, store: &Store) -> RuntimeResult<()> {
        for torrent in store.fetch_empty_at("Listing").await? {
            store.delete_package_files_by_torrent(torrent.id).await?;
            store.advance_torrent_stage(torrent.id, READY_STAGE).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_rolls_back_to_the_ready_stage() {
        assert_eq!(READY_STAGE, "Packaged");
    }
}
