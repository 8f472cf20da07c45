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
#![allow(clippy::multiple_crate_versions)]

//! Filesystem post-processing pipeline for completed torrents: permission
//! normalization, tar archiving, size-bounded splitting with streaming
//! SHA-256, the path manager, and ownership enforcement.

pub mod archive;
pub mod error;
pub mod hash;
pub mod packager;
pub mod path;
pub mod permissions;
pub mod split;

pub use archive::extract_archive;
pub use error::{FsOpsError, FsOpsResult};
pub use hash::sha256_hex;
pub use packager::{create_package, PackageOptions};
pub use path::{list_chunk_filenames, PathManager, PathSpec};
pub use split::{effective_chunk_size, join_files, PackageFileDraft};
