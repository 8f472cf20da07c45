#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Layered configuration for the producer and consumer binaries: a base
//! file sectioned by component/worker-class name, `DASD_<SECTION>_<KEY>`
//! environment overrides, and eager validation at startup (§4.11).

mod error;
mod loader;
mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::load;
pub use model::{
    AppConfig, DatabaseConfig, DispatcherConfig, HttpClientConfig, PackagingConfig,
    PathManagerConfig, WorkerConfig,
};
