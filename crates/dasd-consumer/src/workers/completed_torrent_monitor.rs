//! Polls the producer for its known torrent names and seeds a new `Torrent`
//! row at `Packaging` for anything not yet locally known (§4.8), grounded on
//! `daserver/dasdaemon/workers/completed_torrent_monitor.py`: an in-memory
//! set diffed against the remote listing on every tick, rehydrated from the
//! database on startup.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_api_models::TorrentNamesResponse;
use dasd_data::Store;
use dasd_http::Client;
use dasd_runtime::{Outcome, RuntimeResult, WorkError, Worker};
use tokio::sync::Mutex;

use super::{request_error, storage_error, unattributed};

/// The initial `Torrent` stage: also `CompletedTorrentPackager`'s registered
/// `ConsumerKey` (a same-key bypass, since `Packaging` has no resting
/// predecessor the dispatcher's ordinary fanout could read from).
pub const INITIAL_STAGE: &str = "Packaging";

/// Periodic poller: diffs the producer's reported torrent names against the
/// local database, creating a new `Torrent` row for each unseen name.
pub struct CompletedTorrentMonitor {
    store: Arc<Store>,
    client: Arc<Client>,
    sleep: Duration,
    known: Mutex<HashSet<String>>,
}

impl CompletedTorrentMonitor {
    /// Build the monitor. The known-name set is rehydrated from the store in
    /// `prepare`, not here.
    #[must_use]
    pub fn new(store: Arc<Store>, client: Arc<Client>, sleep: Duration) -> Self {
        Self {
            store,
            client,
            sleep,
            known: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl Worker for CompletedTorrentMonitor {
    fn name(&self) -> &'static str {
        "completed_torrent_monitor"
    }

    async fn prepare(&self) -> RuntimeResult<()> {
        let names = self.store.all_names().await?;
        *self.known.lock().await = names.into_iter().collect();
        Ok(())
    }

    async fn work(&self) -> Result<Outcome, WorkError> {
        let response: TorrentNamesResponse = self
            .client
            .get_json("torrents/")
            .await
            .map_err(|source| unattributed(request_error(&source)))?;

        let mut known = self.known.lock().await;
        for name in response.0 {
            if known.contains(&name) {
                continue;
            }
            self.store
                .create_torrent(&name, INITIAL_STAGE)
                .await
                .map_err(|source| unattributed(storage_error(&source)))?;
            known.insert(name);
        }
        Ok(Outcome::Continue)
    }

    fn sleep_duration(&self) -> Duration {
        self.sleep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_stage_is_the_processing_stage_itself() {
        assert_eq!(INITIAL_STAGE, "Packaging");
    }
}
