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

//! Dispatcher, worker-pool, and retry-scheduler engine shared by the
//! consumer's stage workers (§4.6-§4.9).
//!
//! Layout: `registry.rs` (query-function registry and tick loop),
//! `queue.rs` (consumer registration and database-resident queue fanout),
//! `worker.rs` (the `Worker` trait, `WorkerGroup`, and `set_error`),
//! `error_handler.rs` (the retry scheduler).

mod error;
mod error_handler;
mod queue;
mod registry;
mod worker;

pub use error::{RuntimeError, RuntimeResult};
pub use error_handler::ErrorRecoveryQuery;
pub use queue::{ConsumerHandle, ConsumerKey, Dispatcher};
pub use registry::{OneTimeQueryFunction, PeriodicQueryFunction, Registry};
pub use worker::{set_error, EntityKind, FailedEntity, Outcome, Worker, WorkError, WorkerGroup};
