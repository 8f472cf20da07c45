//! Wires the application together from a loaded configuration (§4.13):
//! connect the store, build shared state, assemble the router and the
//! directory monitor.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;

use dasd_config::AppConfig;
use dasd_data::Store;

use crate::monitor::DirectoryMonitor;
use crate::state::AppState;

/// The fully wired producer: an axum router ready to serve, and a directory
/// monitor ready to run as a background task.
pub struct App {
    /// The axum router implementing the producer HTTP surface.
    pub router: Router,
    /// The background directory monitor.
    pub monitor: DirectoryMonitor,
}

/// Build the application from configuration.
///
/// # Errors
///
/// Returns an error if the database connection cannot be established.
pub async fn build(config: &AppConfig) -> anyhow::Result<App> {
    let store = Store::connect(&config.database.url, config.database.max_connections)
        .await
        .context("connecting to database")?;
    let state = AppState::new(config, Arc::new(store));
    let router = crate::http::build_router(state.clone());
    let monitor = DirectoryMonitor::new(state);
    Ok(App { router, monitor })
}
