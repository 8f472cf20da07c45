//! Shared application state handed to every axum handler.

use std::sync::Arc;

use dasd_config::AppConfig;
use dasd_data::Store;
use dasd_fsops::PathSpec;

use crate::auth::TokenAuthority;

/// Everything a producer HTTP handler needs: the store, the on-disk
/// layout, and the single shared-credential token authority.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer, used for the producer's own bookkeeping of which
    /// completed torrents have been packaged.
    pub store: Arc<Store>,
    /// Flat directory the producer serves chunk downloads from
    /// (`<base>/<filename>`, matching the `GET /download/<filename>/`
    /// route, which carries no torrent segment).
    pub package_files: PathSpec,
    /// Directory the directory monitor watches for newly completed
    /// torrents; also where the packaging engine reads its source from.
    pub source_root: PathSpec,
    /// Packaging tunables derived from the loaded configuration.
    pub package_options: dasd_fsops::PackageOptions,
    /// Issues and validates the single shared bearer token.
    pub auth: Arc<TokenAuthority>,
}

impl AppState {
    /// Build application state from a loaded configuration and a connected
    /// store.
    #[must_use]
    pub fn new(config: &AppConfig, store: Arc<Store>) -> Self {
        let package_options = dasd_fsops::PackageOptions::new(
            config.packaging.min_chunk_size_bytes,
            config.packaging.max_package_files,
        );
        let auth = Arc::new(TokenAuthority::new(
            config.http_client.username.clone(),
            config.http_client.password.clone(),
        ));
        Self {
            store,
            package_files: config.path_manager.package_files.clone(),
            source_root: config.path_manager.master.clone(),
            package_options,
            auth,
        }
    }
}
