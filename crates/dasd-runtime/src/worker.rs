//! Worker groups (§4.7), grounded on
//! `daserver/dasdaemon/managers/worker_manager.py`: a worker class declares
//! the stage(s) it processes and its instance count; a group instantiates
//! `num_workers` identical tasks sharing one `prepare` call.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_core::{ErrorKind, PipelineError, ERROR_STAGE};
use dasd_data::Store;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{RuntimeError, RuntimeResult};

/// Which repository owns the entity a failed unit of work was operating on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A row in the `torrents` table.
    Torrent,
    /// A row in the `package_files` table.
    PackageFile,
}

/// Identifies the row a failed unit of work was operating on, so the
/// generic retry machinery can record the failure without knowing the
/// concrete worker that produced it.
#[derive(Debug, Clone, Copy)]
pub struct FailedEntity {
    /// Torrent or package file.
    pub kind: EntityKind,
    /// Row id.
    pub id: Uuid,
    /// The stage the entity was in when the failure occurred, recorded on
    /// the error row so the retry scheduler knows where to roll back to.
    pub stage_at_failure: &'static str,
}

/// A `work()` failure: the underlying pipeline error, plus the entity it
/// should be attributed to, if any. Errors with no entity (e.g. failing to
/// open a channel) are logged but not recorded via `set_error`.
#[derive(Debug)]
pub struct WorkError {
    /// The entity the error should be attributed to.
    pub entity: Option<FailedEntity>,
    /// The underlying failure.
    pub error: PipelineError,
}

/// What a single `work()` call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Run again after `sleep_duration`.
    Continue,
    /// A shutdown sentinel was observed; this worker's loop should exit.
    Stopped,
}

/// A stage worker's behavior: what it does each iteration, how long it
/// sleeps between iterations, and (optionally) what it does once before its
/// group's tasks start.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Runs exactly once per group, before any worker task starts.
    async fn prepare(&self) -> RuntimeResult<()> {
        Ok(())
    }

    /// Perform one unit of work.
    async fn work(&self) -> Result<Outcome, WorkError>;

    /// Time to sleep between iterations: zero for pure queue consumers,
    /// positive for pollers.
    fn sleep_duration(&self) -> Duration {
        Duration::ZERO
    }
}

/// Owns the spawned tasks for one worker class: `num_workers` identical
/// loops sharing one `prepare` call (guarded by a `OnceCell`, so a second
/// `start` on an already-prepared group is a no-op).
pub struct WorkerGroup<W> {
    worker: Arc<W>,
    num_workers: usize,
    store: Arc<Store>,
    prepared: Arc<OnceCell<()>>,
    handles: Vec<JoinHandle<()>>,
}

impl<W: Worker> WorkerGroup<W> {
    /// Build a group of `num_workers` tasks around `worker`, sharing `store`.
    #[must_use]
    pub fn new(worker: W, num_workers: usize, store: Arc<Store>) -> Self {
        Self {
            worker: Arc::new(worker),
            num_workers,
            store,
            prepared: Arc::new(OnceCell::new()),
            handles: Vec::new(),
        }
    }

    /// Run `prepare` once, then spawn `num_workers` tasks running the loop
    /// described in §4.7.
    ///
    /// # Errors
    ///
    /// Returns an error if `prepare` fails.
    pub async fn start(&mut self) -> RuntimeResult<()> {
        let worker = self.worker.clone();
        self.prepared
            .get_or_try_init(|| async move { worker.prepare().await })
            .await
            .map_err(|source| RuntimeError::Prepare {
                group: self.worker.name(),
                message: source.to_string(),
            })?;

        for _ in 0..self.num_workers {
            let worker = self.worker.clone();
            let store = self.store.clone();
            self.handles.push(tokio::spawn(async move {
                loop {
                    match worker.work().await {
                        Ok(Outcome::Continue) => {}
                        Ok(Outcome::Stopped) => break,
                        Err(work_error) => {
                            tracing::error!(
                                worker = worker.name(),
                                error = %work_error.error,
                                "worker iteration failed"
                            );
                            if let Some(entity) = work_error.entity {
                                if let Err(record_error) =
                                    set_error(&store, entity, &work_error.error).await
                                {
                                    tracing::error!(
                                        worker = worker.name(),
                                        error = %record_error,
                                        "failed to record worker error"
                                    );
                                }
                            }
                        }
                    }

                    let sleep = worker.sleep_duration();
                    if !sleep.is_zero() {
                        tokio::time::sleep(sleep).await;
                    }
                }
            }));
        }

        Ok(())
    }

    /// Wait for every spawned task to exit. Intended to be called after the
    /// owning dispatcher's channels have received their shutdown sentinels.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(error) = handle.await {
                tracing::error!(%error, "worker task panicked");
            }
        }
    }
}

/// Record a `work()` failure against its entity and move it to the error
/// stage (§4.9): upsert by `(entity, kind)`, growing the retry delay if an
/// error is already on file, then set `stage = Error`.
pub async fn set_error(
    store: &Store,
    entity: FailedEntity,
    error: &PipelineError,
) -> RuntimeResult<()> {
    let kind: ErrorKind = error.kind();
    let message = error.to_string();
    match entity.kind {
        EntityKind::Torrent => {
            store
                .upsert_torrent_error(entity.id, kind, &message, entity.stage_at_failure)
                .await?;
            store.advance_torrent_stage(entity.id, ERROR_STAGE).await?;
        }
        EntityKind::PackageFile => {
            store
                .upsert_package_file_error(entity.id, kind, &message, entity.stage_at_failure)
                .await?;
            store
                .advance_package_file_stage(entity.id, ERROR_STAGE)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountToThree {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Worker for CountToThree {
        fn name(&self) -> &'static str {
            "count_to_three"
        }

        async fn work(&self) -> Result<Outcome, WorkError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= 3 {
                Ok(Outcome::Stopped)
            } else {
                Ok(Outcome::Continue)
            }
        }
    }

    #[tokio::test]
    async fn group_runs_until_stopped() {
        let pool = sqlx::PgPool::connect_lazy("postgres://unused/unused").unwrap();
        let store = Arc::new(Store::from_pool(pool));
        let worker = CountToThree {
            calls: AtomicUsize::new(0),
        };
        let mut group = WorkerGroup::new(worker, 1, store);

        group.start().await.unwrap();
        group.join().await;
    }
}
