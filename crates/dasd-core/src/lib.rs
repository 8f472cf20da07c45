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
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! Domain types shared across the packaging/shipping pipeline: the stage
//! algebra, the plain (persistence-independent) entity shapes, and the
//! pipeline-level error taxonomy.

pub mod entity;
pub mod error;
pub mod stage;

pub use entity::{
    ErrorKind, ErrorRecord, PackageFile, Torrent, grow_retry_delay, INITIAL_RETRY_DELAY_SECS,
    MAX_RETRY_DELAY_SECS,
};
pub use error::{FatalError, PipelineError};
pub use stage::{Stage, StageError, StageList, ERROR_STAGE, PACKAGE_FILE_STAGES, TORRENT_STAGES};
