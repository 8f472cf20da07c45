//! Typed configuration sections. Each mirrors one `[section]` in the base
//! file; nothing here parses or validates — see [`crate::loader`].

use dasd_fsops::PathSpec;
use serde::Deserialize;

/// `[database]`
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string.
    pub url: String,
    /// Pool size passed to `dasd_data::Store::connect`.
    pub max_connections: u32,
}

/// `[dispatcher]`
#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Seconds the dispatcher sleeps between ticks.
    pub tick_interval_secs: u64,
}

/// `[packaging]`: tunables for the producer's packaging engine (§4.1).
#[derive(Debug, Clone, Deserialize)]
pub struct PackagingConfig {
    /// Minimum chunk size in bytes.
    pub min_chunk_size_bytes: u64,
    /// Maximum number of package files a single torrent may emit.
    pub max_package_files: u32,
}

/// `[http_client]`
#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
    /// Base URL of the producer's HTTP API.
    pub base_url: String,
    /// Request timeout, in seconds.
    pub timeout_secs: u64,
    /// Lifetime of a cached auth token before it is refreshed proactively.
    pub token_expiration_sec: u64,
    /// Username presented to `/auth/api-token-auth/`.
    pub username: String,
    /// Password presented to `/auth/api-token-auth/`.
    pub password: String,
}

/// One worker-class section: `[completed_torrent_monitor]`,
/// `[package_downloader]`, and so on.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent task instances in the group.
    pub num_workers: u32,
    /// Seconds a poller sleeps between iterations (0 for pure queue consumers).
    pub sleep_secs: u64,
    /// Class-specific endpoint, empty for classes that don't poll the producer.
    #[serde(default)]
    pub url: String,
}

/// Raw `[path_manager]` as written in the file: six
/// `path,owner,group,dmode,fmode` lines, still unparsed.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPathManagerConfig {
    pub package_files: String,
    pub failed_package_files: String,
    pub unsorted_package: String,
    pub unknown_package: String,
    pub master: String,
    pub new_dir: String,
}

/// `[path_manager]` after each line has been parsed into a [`PathSpec`].
#[derive(Debug, Clone)]
pub struct PathManagerConfig {
    /// Directory holding in-flight and completed chunk files, per torrent.
    pub package_files: PathSpec,
    /// Directory holding chunks that failed integrity checks.
    pub failed_package_files: PathSpec,
    /// Directory holding extracted, unsorted output, per torrent.
    pub unsorted_package: PathSpec,
    /// Directory holding package files for torrents the producer can't match.
    pub unknown_package: PathSpec,
    /// Directory the directory monitor watches for completed torrents.
    pub master: PathSpec,
    /// Drop-off directory for newly arriving completed torrents.
    pub new_dir: PathSpec,
}

impl PathManagerConfig {
    /// Build the two-spec path manager `dasd-fsops` operates against.
    #[must_use]
    pub fn fsops_manager(&self) -> dasd_fsops::PathManager {
        dasd_fsops::PathManager::new(self.package_files.clone(), self.unsorted_package.clone())
    }
}

/// Raw, file-shaped configuration before `[path_manager]` lines are parsed
/// and before semantic validation runs.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawConfig {
    pub database: DatabaseConfig,
    pub dispatcher: DispatcherConfig,
    pub packaging: PackagingConfig,
    pub http_client: HttpClientConfig,
    pub path_manager: RawPathManagerConfig,
    pub completed_torrent_monitor: WorkerConfig,
    pub completed_torrent_packager: WorkerConfig,
    pub packaged_torrent_lister: WorkerConfig,
    pub package_downloader: WorkerConfig,
    pub package_extractor: WorkerConfig,
    pub packaged_torrent_monitor: WorkerConfig,
    pub torrent_deleter: WorkerConfig,
}

/// Fully loaded and validated configuration for a producer or consumer
/// process (SPEC_FULL.md §4.11).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `[database]`
    pub database: DatabaseConfig,
    /// `[dispatcher]`
    pub dispatcher: DispatcherConfig,
    /// `[packaging]`
    pub packaging: PackagingConfig,
    /// `[http_client]`
    pub http_client: HttpClientConfig,
    /// `[path_manager]`, parsed.
    pub path_manager: PathManagerConfig,
    /// `[completed_torrent_monitor]`
    pub completed_torrent_monitor: WorkerConfig,
    /// `[completed_torrent_packager]`
    pub completed_torrent_packager: WorkerConfig,
    /// `[packaged_torrent_lister]`
    pub packaged_torrent_lister: WorkerConfig,
    /// `[package_downloader]`
    pub package_downloader: WorkerConfig,
    /// `[package_extractor]`
    pub package_extractor: WorkerConfig,
    /// `[packaged_torrent_monitor]`
    pub packaged_torrent_monitor: WorkerConfig,
    /// `[torrent_deleter]`
    pub torrent_deleter: WorkerConfig,
}
