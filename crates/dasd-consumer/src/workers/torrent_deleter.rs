//! Consumes torrents at `Extracted` and advances them to `Deleted`.
//! Grounded on `daserver/dasdaemon/workers/torrent_deleter.py`, which,
//! despite its name, performs no filesystem deletion of its own - cleanup
//! already happened when the extractor removed the joined chunk directory.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_core::Torrent;
use dasd_data::Store;
use dasd_runtime::{ConsumerHandle, Outcome, WorkError, Worker};

use super::{storage_error, torrent_failure};

/// The stage this worker consumes from.
pub const READY_STAGE: &str = "Extracted";
/// The terminal stage this worker advances torrents to.
pub const TARGET_STAGE: &str = "Deleted";

/// Queue consumer: the pipeline's final stage transition.
pub struct TorrentDeleter {
    store: Arc<Store>,
    handle: ConsumerHandle<Torrent>,
}

impl TorrentDeleter {
    /// Build the worker around an already-registered consumer handle.
    #[must_use]
    pub const fn new(store: Arc<Store>, handle: ConsumerHandle<Torrent>) -> Self {
        Self { store, handle }
    }
}

#[async_trait]
impl Worker for TorrentDeleter {
    fn name(&self) -> &'static str {
        "torrent_deleter"
    }

    async fn work(&self) -> Result<Outcome, WorkError> {
        let Some(torrent) = self.handle.recv().await else {
            return Ok(Outcome::Stopped);
        };

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
    fn terminal_stage_is_deleted() {
        assert_eq!(TARGET_STAGE, "Deleted");
    }
}
