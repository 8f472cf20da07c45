//! Wires the consumer together from a loaded configuration (§4.13): connect
//! the store, build the producer client and path manager, register the
//! dispatcher's consumer keys, and assemble the seven worker groups plus the
//! query-function registry that drives them.

use std::sync::Arc;
use std::time::Duration;

use dasd_config::AppConfig;
use dasd_data::Store;
use dasd_http::Client;
use dasd_runtime::{ConsumerKey, Dispatcher, ErrorRecoveryQuery, PeriodicQueryFunction, Registry, WorkerGroup};

use crate::workers::{
    CompletedTorrentMonitor, CompletedTorrentPackager, ListerRecoveryQuery, PackageDownloader,
    PackageDownloaderRecoveryQuery, PackageExtractor, PackagedTorrentLister, PackagedTorrentMonitor,
    TorrentAggregationQuery, TorrentDeleter,
};

/// The fully wired consumer: a query-function registry driving the
/// dispatcher and retry scheduler, and one worker group per stage.
pub struct App {
    /// Drives the dispatcher, error recovery, and the workers' own query
    /// functions on a fixed tick.
    pub registry: Arc<Registry>,
    /// Fans database rows out to the queue consumers below; also pushes the
    /// shutdown sentinel each worker group's tasks exit on.
    pub dispatcher: Arc<Dispatcher>,
    /// Polls the producer for newly completed torrents.
    pub completed_torrent_monitor: WorkerGroup<CompletedTorrentMonitor>,
    /// Packages newly discovered torrents.
    pub completed_torrent_packager: WorkerGroup<CompletedTorrentPackager>,
    /// Reconciles torrents the producer already reports as packaged.
    pub packaged_torrent_monitor: WorkerGroup<PackagedTorrentMonitor>,
    /// Lists a packaged torrent's chunk files.
    pub packaged_torrent_lister: WorkerGroup<PackagedTorrentLister>,
    /// Downloads packaged chunk files.
    pub package_downloader: WorkerGroup<PackageDownloader>,
    /// Extracts a torrent's joined archive.
    pub package_extractor: WorkerGroup<PackageExtractor>,
    /// Performs the pipeline's terminal stage transition.
    pub torrent_deleter: WorkerGroup<TorrentDeleter>,
}

/// Build the application from configuration.
///
/// # Errors
///
/// Returns an error if the database connection or producer client cannot be
/// established.
pub async fn build(config: &AppConfig) -> anyhow::Result<App> {
    let store = Arc::new(Store::connect(&config.database.url, config.database.max_connections).await?);
    let client = Arc::new(Client::new(&config.http_client)?);
    let path_manager = Arc::new(config.path_manager.fsops_manager());
    let dispatcher = Arc::new(Dispatcher::new());

    let packager_handle = dispatcher
        .register_torrent_consumer(ConsumerKey::new("Packaging", "Packaging"))
        .await;
    let lister_handle = dispatcher
        .register_torrent_consumer(ConsumerKey::new("Packaged", "Listing"))
        .await;
    let downloader_handle = dispatcher
        .register_package_file_consumer(ConsumerKey::new("Added", "Downloading"))
        .await;
    let extractor_handle = dispatcher
        .register_torrent_consumer(ConsumerKey::new("Downloaded", "Extracting"))
        .await;
    let deleter_handle = dispatcher
        .register_torrent_consumer(ConsumerKey::new("Extracted", "Deleting"))
        .await;

    let registry = Arc::new(Registry::new(
        store.clone(),
        Duration::from_secs(config.dispatcher.tick_interval_secs),
    ));
    registry.register_periodic(dispatcher.clone()).await;
    registry
        .register_periodic(Arc::new(ErrorRecoveryQuery) as Arc<dyn PeriodicQueryFunction>)
        .await;
    registry
        .register_periodic(Arc::new(TorrentAggregationQuery) as Arc<dyn PeriodicQueryFunction>)
        .await;
    registry.register_one_time(Arc::new(ListerRecoveryQuery)).await;
    registry.register_one_time(Arc::new(PackageDownloaderRecoveryQuery)).await;

    let completed_torrent_monitor = WorkerGroup::new(
        CompletedTorrentMonitor::new(
            store.clone(),
            client.clone(),
            Duration::from_secs(config.completed_torrent_monitor.sleep_secs),
        ),
        config.completed_torrent_monitor.num_workers as usize,
        store.clone(),
    );
    let completed_torrent_packager = WorkerGroup::new(
        CompletedTorrentPackager::new(store.clone(), client.clone(), packager_handle),
        config.completed_torrent_packager.num_workers as usize,
        store.clone(),
    );
    let packaged_torrent_monitor = WorkerGroup::new(
        PackagedTorrentMonitor::new(
            store.clone(),
            client.clone(),
            Duration::from_secs(config.packaged_torrent_monitor.sleep_secs),
        ),
        config.packaged_torrent_monitor.num_workers as usize,
        store.clone(),
    );
    let packaged_torrent_lister = WorkerGroup::new(
        PackagedTorrentLister::new(store.clone(), client.clone(), lister_handle),
        config.packaged_torrent_lister.num_workers as usize,
        store.clone(),
    );
    let package_downloader = WorkerGroup::new(
        PackageDownloader::new(store.clone(), client.clone(), path_manager.clone(), downloader_handle),
        config.package_downloader.num_workers as usize,
        store.clone(),
    );
    let package_extractor = WorkerGroup::new(
        PackageExtractor::new(store.clone(), path_manager.clone(), extractor_handle),
        config.package_extractor.num_workers as usize,
        store.clone(),
    );
    let torrent_deleter = WorkerGroup::new(
        TorrentDeleter::new(store.clone(), deleter_handle),
        config.torrent_deleter.num_workers as usize,
        store.clone(),
    );

    Ok(App {
        registry,
        dispatcher,
        completed_torrent_monitor,
        completed_torrent_packager,
        packaged_torrent_monitor,
        packaged_torrent_lister,
        package_downloader,
        package_extractor,
        torrent_deleter,
    })
}
