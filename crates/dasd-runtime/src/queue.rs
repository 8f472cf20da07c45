//! Database-resident queue fanout (§4.6), grounded on
//! `daserver/dasdaemon/managers/queue_manager.py`: consumers register by
//! `(ready_stage, processing_stage)`, sharing one channel and refcount per
//! key. Each tick, the dispatcher moves every row at `ready_stage` to
//! `processing_stage` and pushes it onto that consumer's channel -
//! move-then-publish, so a row is never visible on a channel before its DB
//! stage has already advanced out of `ready`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dasd_core::{PackageFile, Torrent};
use dasd_data::Store;
use tokio::sync::{mpsc, Mutex};

use crate::error::RuntimeResult;
use crate::registry::PeriodicQueryFunction;

/// A registered `(ready_stage, processing_stage)` pair. Two workers
/// registering the same pair share one channel and one refcount, matching
/// the source `Consumer.__eq__`/`__hash__` identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerKey {
    /// Stage a row must be in to be picked up by this consumer.
    pub ready_stage: &'static str,
    /// Stage the dispatcher moves a row to before publishing it.
    pub processing_stage: &'static str,
}

impl ConsumerKey {
    /// Build a consumer key.
    #[must_use]
    pub const fn new(ready_stage: &'static str, processing_stage: &'static str) -> Self {
        Self {
            ready_stage,
            processing_stage,
        }
    }
}

/// The receiving half of a registered consumer's channel. Cloning shares the
/// same underlying queue: multiple worker tasks in one group all receive
/// from the same `ConsumerHandle`, exactly as multiple Python threads shared
/// one `Queue.Queue` in the source.
#[derive(Clone)]
pub struct ConsumerHandle<T> {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<Option<T>>>>,
}

impl<T> ConsumerHandle<T> {
    /// Block until an item (or the shutdown sentinel) is available.
    /// Returns `None` once the sentinel has been consumed.
    pub async fn recv(&self) -> Option<T> {
        self.receiver.lock().await.recv().await.flatten()
    }
}

struct ConsumerChannel<T> {
    sender: mpsc::UnboundedSender<Option<T>>,
    handle: ConsumerHandle<T>,
    refcount: usize,
}

/// Registers torrent and package-file consumers and fans database rows out
/// to their channels on every dispatcher tick.
pub struct Dispatcher {
    torrent_order: Mutex<Vec<ConsumerKey>>,
    torrent_consumers: Mutex<HashMap<ConsumerKey, ConsumerChannel<Torrent>>>,
    package_file_order: Mutex<Vec<ConsumerKey>>,
    package_file_consumers: Mutex<HashMap<ConsumerKey, ConsumerChannel<PackageFile>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Build an empty dispatcher with no registered consumers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            torrent_order: Mutex::new(Vec::new()),
            torrent_consumers: Mutex::new(HashMap::new()),
            package_file_order: Mutex::new(Vec::new()),
            package_file_consumers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a torrent consumer, returning the channel it should read
    /// from. Registering the same `key` twice increments its refcount and
    /// returns a handle to the same channel.
    pub async fn register_torrent_consumer(&self, key: ConsumerKey) -> ConsumerHandle<Torrent> {
        let mut order = self.torrent_order.lock().await;
        let mut consumers = self.torrent_consumers.lock().await;
        if !consumers.contains_key(&key) {
            let (sender, receiver) = mpsc::unbounded_channel();
            consumers.insert(
                key,
                ConsumerChannel {
                    sender,
                    handle: ConsumerHandle {
                        receiver: Arc::new(Mutex::new(receiver)),
                    },
                    refcount: 0,
                },
            );
            order.push(key);
            tracing::debug!(?key, "registered torrent consumer");
        }
        let channel = consumers.get_mut(&key).expect("just inserted above");
        channel.refcount += 1;
        channel.handle.clone()
    }

    /// Register a package-file consumer; see `register_torrent_consumer`.
    pub async fn register_package_file_consumer(
        &self,
        key: ConsumerKey,
    ) -> ConsumerHandle<PackageFile> {
        let mut order = self.package_file_order.lock().await;
        let mut consumers = self.package_file_consumers.lock().await;
        if !consumers.contains_key(&key) {
            let (sender, receiver) = mpsc::unbounded_channel();
            consumers.insert(
                key,
                ConsumerChannel {
                    sender,
                    handle: ConsumerHandle {
                        receiver: Arc::new(Mutex::new(receiver)),
                    },
                    refcount: 0,
                },
            );
            order.push(key);
            tracing::debug!(?key, "registered package file consumer");
        }
        let channel = consumers.get_mut(&key).expect("just inserted above");
        channel.refcount += 1;
        channel.handle.clone()
    }

    /// Set the stop signal and push one sentinel per registered instance
    /// onto every channel, waking every blocked worker exactly once.
    pub async fn stop(&self) {
        tracing::info!("dispatcher: stopping consumers");
        let torrent_consumers = self.torrent_consumers.lock().await;
        for channel in torrent_consumers.values() {
            for _ in 0..channel.refcount {
                let _ = channel.sender.send(None);
            }
        }
        let package_file_consumers = self.package_file_consumers.lock().await;
        for channel in package_file_consumers.values() {
            for _ in 0..channel.refcount {
                let _ = channel.sender.send(None);
            }
        }
    }
}

#[async_trait]
impl PeriodicQueryFunction for Dispatcher {
    async fn run(&self, store: &Store) -> RuntimeResult<()> {
        let torrent_order = self.torrent_order.lock().await.clone();
        let torrent_consumers = self.torrent_consumers.lock().await;
        for key in &torrent_order {
            let channel = torrent_consumers
                .get(key)
                .expect("consumer present for every registered key");
            tracing::debug!(?key, "processing torrent consumer");
            for torrent in store.fetch_ready_torrents(key.ready_stage).await? {
                store
                    .advance_torrent_stage(torrent.id, key.processing_stage)
                    .await?;
                let _ = channel.sender.send(Some(torrent));
            }
        }
        drop(torrent_consumers);

        let package_file_order = self.package_file_order.lock().await.clone();
        let package_file_consumers = self.package_file_consumers.lock().await;
        for key in &package_file_order {
            let channel = package_file_consumers
                .get(key)
                .expect("consumer present for every registered key");
            tracing::debug!(?key, "processing package file consumer");
            for package_file in store.fetch_ready_package_files(key.ready_stage).await? {
                store
                    .advance_package_file_stage(package_file.id, key.processing_stage)
                    .await?;
                let _ = channel.sender.send(Some(package_file));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registering_the_same_key_twice_shares_one_channel() {
        let dispatcher = Dispatcher::new();
        let key = ConsumerKey::new("Packaging", "Packaging");

        dispatcher.register_torrent_consumer(key).await;
        dispatcher.register_torrent_consumer(key).await;

        let consumers = dispatcher.torrent_consumers.lock().await;
        assert_eq!(consumers.len(), 1);
        assert_eq!(consumers.get(&key).unwrap().refcount, 2);
    }

    #[tokio::test]
    async fn stop_pushes_one_sentinel_per_refcount() {
        let dispatcher = Dispatcher::new();
        let key = ConsumerKey::new("Packaging", "Packaging");
        let handle_a = dispatcher.register_torrent_consumer(key).await;
        let _handle_b = dispatcher.register_torrent_consumer(key).await;

        dispatcher.stop().await;

        assert!(handle_a.recv().await.is_none());
        assert!(handle_a.recv().await.is_none());
    }
}
