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

//! The producer side of the pipeline (SPEC_FULL.md §4.1, §4.2, §6): the
//! packaging engine, the completed-torrents directory monitor, and the
//! HTTP surface the consumer's `dasd-http::Client` talks to.
//!
//! Layout: `auth.rs` (single shared-credential token issuance and
//! validation), `packaging.rs` (bridges `dasd-fsops`'s packaging pipeline
//! to the `dasd-data` repositories), `monitor.rs` (the `notify`-backed
//! directory watcher), `state.rs` (shared application state), `error.rs`
//! (the `ApiError` response type), `http/` (the axum router and handlers),
//! `bootstrap.rs` (wiring a `Router` from an `AppConfig`).

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod http;
pub mod monitor;
pub mod packaging;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;
