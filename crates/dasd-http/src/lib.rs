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

//! Token-lifecycle HTTP client used by the consumer's stage workers to talk
//! to the producer's HTTP surface (§4.3).

mod client;
mod error;

pub use client::Client;
pub use error::{HttpError, HttpResult};
