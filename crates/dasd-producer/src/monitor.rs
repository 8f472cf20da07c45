//! Completed-torrents directory monitor (§4.2), grounded on
//! `dasdremote/dasdremote/workers/completed_torrent_monitor.py` and
//! `completed_torrent_packager.py` from the original source: watch for
//! torrents landing in the source directory, record them, and package them
//! eagerly in the background (the `POST /torrents/` trigger stays
//! idempotent for anyone who gets there first).

use std::collections::HashSet;

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Watches `state.source_root` for newly arrived completed torrents.
pub struct DirectoryMonitor {
    state: AppState,
}

impl DirectoryMonitor {
    /// Build a monitor over the given application state.
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Rehydrate the known-torrent set from the store, then watch for
    /// arrivals until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch directory cannot be read or watched.
    pub async fn run(self, cancel: CancellationToken) -> anyhow::Result<()> {
        let mut known: HashSet<String> = self.state.store.all_names().await?.into_iter().collect();
        let watch_dir = self.state.source_root.path.clone();

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            let Ok(event) = result else { return };
            if !is_arrival(&event.kind) {
                return;
            }
            for path in event.paths {
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    let _ = tx.send(name.to_string());
                }
            }
        })?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        tracing::info!(dir = %watch_dir.display(), "watching for completed torrents");

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    let _ = watcher.unwatch(&watch_dir);
                    break;
                }
                received = rx.recv() => {
                    let Some(name) = received else { break };
                    if known.insert(name.clone()) {
                        self.handle_arrival(&name).await;
                    }
                }
            }
        }

        tracing::info!("directory monitor stopped");
        Ok(())
    }

    async fn handle_arrival(&self, name: &str) {
        let initial_stage = dasd_core::TORRENT_STAGES.initial().name();
        if let Err(error) = self.state.store.create_torrent(name, initial_stage).await {
            tracing::warn!(torrent = name, error = ?error, "failed to record newly discovered torrent");
            return;
        }
        tracing::info!(torrent = name, "discovered completed torrent");
        if let Err(error) = crate::packaging::package_torrent(&self.state, name).await {
            tracing::warn!(
                torrent = name,
                error = ?error,
                "background packaging failed; will retry on the next GET/POST /torrents/"
            );
        }
    }
}

fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(CreateKind::Any | CreateKind::Folder | CreateKind::File)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_create_and_rename_to_as_arrivals() {
        assert!(is_arrival(&EventKind::Create(CreateKind::Folder)));
        assert!(is_arrival(&EventKind::Modify(ModifyKind::Name(RenameMode::To))));
        assert!(!is_arrival(&EventKind::Remove(notify::event::RemoveKind::Any)));
    }
}
