//! Query function registry (§4.6/§4.7), grounded on
//! `daserver/dasdaemon/managers/database_manager.py`: a tick loop that runs
//! every one-time function once and clears the list, then runs every
//! periodic function, sleeping `tick_interval` between passes.
//!
//! Workers and the dispatcher are assembled into this registry explicitly at
//! program start, not discovered reflectively.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dasd_data::Store;
use tokio::sync::{Mutex, Notify};

use crate::error::RuntimeResult;

/// Runs exactly once, the first time the dispatcher ticks. Used for crash
/// recovery: e.g. moving `processing`-stage rows without a
/// `package_files_count` back to `ready`.
#[async_trait]
pub trait OneTimeQueryFunction: Send + Sync {
    /// Run the recovery query once against `store`.
    async fn run(&self, store: &Store) -> RuntimeResult<()>;
}

/// Runs on every dispatcher tick: queue fanout, the retry scheduler, and any
/// other periodic maintenance query.
#[async_trait]
pub trait PeriodicQueryFunction: Send + Sync {
    /// Run the query once against `store`.
    async fn run(&self, store: &Store) -> RuntimeResult<()>;
}

/// Registry of query functions plus the tick loop that drives them.
pub struct Registry {
    store: Arc<Store>,
    tick_interval: Duration,
    one_time: Mutex<Vec<Arc<dyn OneTimeQueryFunction>>>,
    periodic: Mutex<Vec<Arc<dyn PeriodicQueryFunction>>>,
    stop: Notify,
    stopped: std::sync::atomic::AtomicBool,
}

impl Registry {
    /// Build an empty registry over `store`, ticking every `tick_interval`.
    #[must_use]
    pub fn new(store: Arc<Store>, tick_interval: Duration) -> Self {
        Self {
            store,
            tick_interval,
            one_time: Mutex::new(Vec::new()),
            periodic: Mutex::new(Vec::new()),
            stop: Notify::new(),
            stopped: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Register a one-time recovery query, run on the first tick.
    pub async fn register_one_time(&self, function: Arc<dyn OneTimeQueryFunction>) {
        self.one_time.lock().await.push(function);
    }

    /// Register a periodic query, run on every tick.
    pub async fn register_periodic(&self, function: Arc<dyn PeriodicQueryFunction>) {
        self.periodic.lock().await.push(function);
    }

    /// Run one-time functions (once, then clear the list) followed by
    /// periodic functions, repeating every `tick_interval` until `stop` is
    /// called.
    pub async fn run(&self) {
        loop {
            if self.stopped.load(std::sync::atomic::Ordering::Acquire) {
                tracing::info!("registry: stopped");
                return;
            }
            self.execute_tick().await;

            tokio::select! {
                () = tokio::time::sleep(self.tick_interval) => {}
                () = self.stop.notified() => {
                    tracing::info!("registry: stopped");
                    return;
                }
            }
        }
    }

    /// Signal the tick loop to stop after its current pass.
    pub fn stop(&self) {
        self.stopped.store(true, std::sync::atomic::Ordering::Release);
        self.stop.notify_waiters();
    }

    async fn execute_tick(&self) {
        let one_time = std::mem::take(&mut *self.one_time.lock().await);
        for function in &one_time {
            if let Err(error) = function.run(&self.store).await {
                tracing::error!(%error, "one-time query function failed");
            }
        }

        let periodic = self.periodic.lock().await;
        for function in periodic.iter() {
            if let Err(error) = function.run(&self.store).await {
                tracing::error!(%error, "periodic query function failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingOneTime(Arc<AtomicUsize>);

    #[async_trait]
    impl OneTimeQueryFunction for CountingOneTime {
        async fn run(&self, _store: &Store) -> RuntimeResult<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn one_time_functions_run_once_then_clear() {
        let pool = sqlx::PgPool::connect_lazy("postgres://unused/unused").unwrap();
        let store = Arc::new(Store::from_pool(pool));
        let registry = Registry::new(store, Duration::from_secs(5));
        let count = Arc::new(AtomicUsize::new(0));
        registry
            .register_one_time(Arc::new(CountingOneTime(count.clone())))
            .await;

        registry.execute_tick().await;
        registry.execute_tick().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
