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
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Consumer process bootstrap wiring and the seven stage workers that move
//! torrents and package files through the pipeline (§4.6-§4.8).
//!
//! Layout: `bootstrap.rs` (service wiring), `workers/` (one module per
//! stage worker), `error.rs` (application-level error type).

pub mod bootstrap;
/// Application-level error type.
pub mod error;
/// The seven stage workers and the query functions they register.
pub mod workers;

pub use bootstrap::{build, App};
pub use error::{AppError, AppResult};
