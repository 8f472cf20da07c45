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

//! Postgres-backed persistence for torrents, package files, and their error
//! rows: one connection pool per process, migrations run at startup, narrow
//! repository methods instead of a generic ORM (§4.10).

mod errors;
mod package_files;
mod pool;
mod torrents;

pub mod error;

pub use error::{DataError, DataResult};
pub use package_files::PackageFileDraft;
pub use pool::Store;
