//! Reconciliation poller: catches torrents the producer already reports as
//! packaged but that this consumer has never seen (e.g. after a long outage
//! or a fresh deployment pointed at an existing producer). Grounded on
//! `daserver/dasdaemon/workers/packaged_torrent_monitor.py`.
//!
//! Polls the same listing endpoint as `CompletedTorrentMonitor` - the
//! producer exposes a single torrent-name enumeration, not a per-stage one -
//! but seeds unseen names directly at `Packaged` rather than `Packaging`,
//! since these torrents are already packaged on the producer's side. Checks
//! `fetch_by_name` per name rather than trusting an in-memory set, since this
//! worker and `CompletedTorrentMonitor` both create rows from the same
//! upstream listing and must not race each other into a duplicate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_api_models::TorrentNamesResponse;
use dasd_data::Store;
use dasd_http::Client;
use dasd_runtime::{Outcome, WorkError, Worker};

use super::{request_error, storage_error, unattributed};

/// The stage newly reconciled torrents are created at. Already
/// `PackagedTorrentLister`'s `ready_stage`, so no dedicated `ConsumerKey`
/// bypass is needed: the dispatcher's ordinary fanout picks these rows up.
pub const TARGET_STAGE: &str = "Packaged";

/// Periodic poller that reconciles the producer's packaged-torrent listing
/// against the local database.
pub struct PackagedTorrentMonitor {
    store: Arc<Store>,
    client: Arc<Client>,
    sleep: Duration,
}

impl PackagedTorrentMonitor {
    /// Build the monitor.
    #[must_use]
    pub const fn new(store: Arc<Store>, client: Arc<Client>, sleep: Duration) -> Self {
        Self { store, client, sleep }
    }
}

#[async_trait]
impl Worker for PackagedTorrentMonitor {
    fn name(&self) -> &'static str {
        "packaged_torrent_monitor"
    }

    async fn work(&self) -> Result<Outcome, WorkError> {
        let response: TorrentNamesResponse = self
            .client
            .get_json("torrents/")
            .await
            .map_err(|source| unattributed(request_error(&source)))?;

        for name in response.0 {
            let existing = self
                .store
                .fetch_by_name(&name)
                .await
                .map_err(|source| unattributed(storage_error(&source)))?;
            if existing.is_some() {
                continue;
            }
            self.store
                .create_torrent(&name, TARGET_STAGE)
                .await
                .map_err(|source| unattributed(storage_error(&source)))?;
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
    fn target_stage_matches_the_listers_ready_stage() {
        assert_eq!(TARGET_STAGE, "Packaged");
    }
}
