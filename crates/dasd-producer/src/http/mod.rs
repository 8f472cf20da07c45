//! The axum HTTP surface (§6): token auth, the torrent listing/packaging
//! endpoints, and chunk download/delete.

mod auth_middleware;
mod download;
#[cfg(feature = "test-fixtures")]
mod fixtures;
mod login;
mod router;
mod torrents;

pub use router::build_router;
