//! Retry scheduler (§4.9): a periodic query function that rolls entities
//! stuck in the error stage back to their last known-good resting state once
//! enough time has passed, so the next dispatcher tick re-enqueues them.

use async_trait::async_trait;
use dasd_core::{ERROR_STAGE, PACKAGE_FILE_STAGES, TORRENT_STAGES};
use dasd_data::Store;

use crate::error::RuntimeResult;
use crate::registry::PeriodicQueryFunction;

/// Scans both entity tables for rows parked at `Error` and, for any whose
/// most recent error has aged past its `retry_delay_secs`, moves the row
/// back to the resting stage before the one it failed in.
pub struct ErrorRecoveryQuery;

#[async_trait]
impl PeriodicQueryFunction for ErrorRecoveryQuery {
    async fn run(&self, store: &Store) -> RuntimeResult<()> {
        for torrent in store.fetch_ready_torrents(ERROR_STAGE).await? {
            let Some(error) = store.latest_torrent_error(torrent.id).await? else {
                continue;
            };
            if !due_for_retry(&error) {
                continue;
            }
            let recovered = TORRENT_STAGES.stage(&error.stage)?.previous_completed()?;
            tracing::info!(
                torrent_id = %torrent.id,
                recovered_stage = recovered.name(),
                "retrying errored torrent"
            );
            store
                .advance_torrent_stage(torrent.id, recovered.name())
                .await?;
        }

        for package_file in store.fetch_ready_package_files(ERROR_STAGE).await? {
            let Some(error) = store.latest_package_file_error(package_file.id).await? else {
                continue;
            };
            if !due_for_retry(&error) {
                continue;
            }
            let recovered = PACKAGE_FILE_STAGES
                .stage(&error.stage)?
                .previous_completed()?;
            tracing::info!(
                package_file_id = %package_file.id,
                recovered_stage = recovered.name(),
                "retrying errored package file"
            );
            store
                .advance_package_file_stage(package_file.id, recovered.name())
                .await?;
        }

        Ok(())
    }
}

fn due_for_retry(error: &dasd_core::ErrorRecord) -> bool {
    let elapsed = chrono::Utc::now().signed_duration_since(error.time);
    elapsed.num_seconds() > error.retry_delay_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use dasd_core::ErrorRecord;
    use uuid::Uuid;

    fn record(retry_delay_secs: i64, age: Duration) -> ErrorRecord {
        ErrorRecord {
            owner_id: Uuid::new_v4(),
            kind: "request".to_string(),
            message: "boom".to_string(),
            time: Utc::now() - age,
            stage: "Downloading".to_string(),
            count: 1,
            retry_delay_secs,
        }
    }

    #[test]
    fn not_due_before_delay_elapses() {
        let error = record(60, Duration::seconds(10));
        assert!(!due_for_retry(&error));
    }

    #[test]
    fn due_once_delay_elapses() {
        let error = record(5, Duration::seconds(10));
        assert!(due_for_retry(&error));
    }
}
