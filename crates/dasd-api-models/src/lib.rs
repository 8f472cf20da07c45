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

//! Shared HTTP DTOs exchanged between the producer and consumer (§6).
//!
//! These types are the wire contract: the consumer's `dasd-http` client
//! encodes requests and decodes responses with them, and the producer's
//! `axum` handlers in `dasd-producer` encode responses with the same types,
//! keeping the mapping a single source of truth.

use serde::{Deserialize, Serialize};

/// `POST /auth/api-token-auth/` request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenAuthRequest {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// `POST /auth/api-token-auth/` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenAuthResponse {
    /// Bearer token presented as `Authorization: Token <token>` on subsequent calls.
    pub token: String,
}

/// Body shared by `GET /torrents/` (with body) and `POST /torrents/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TorrentNameRequest {
    /// Name of the completed torrent to look up or package.
    pub torrent: String,
}

/// One package chunk as reported by a current producer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageFileDto {
    /// Chunk filename, e.g. `release.tar.0000`.
    pub filename: String,
    /// Chunk size in bytes, when the producer reports it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub filesize: Option<i64>,
    /// Chunk SHA-256 hex digest, when the producer reports it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sha256: Option<String>,
}

/// The package-file listing returned by `GET`/`POST /torrents/`.
///
/// A legacy producer reports a bare array of filenames instead of the
/// `{filename, filesize, sha256}` shape (§9); this type accepts either on
/// deserialize and always serializes the structured form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PackageFileListing(pub Vec<PackageFileDto>);

impl<'de> Deserialize<'de> for PackageFileListing {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Structured(Vec<PackageFileDto>),
            LegacyFilenames(Vec<String>),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Structured(files) => Self(files),
            Wire::LegacyFilenames(names) => Self(
                names
                    .into_iter()
                    .map(|filename| PackageFileDto {
                        filename,
                        filesize: None,
                        sha256: None,
                    })
                    .collect(),
            ),
        })
    }
}

/// Response body of `GET /torrents/` with no body: the packaged-torrent names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TorrentNamesResponse(pub Vec<String>);

/// RFC 9457-compatible problem document surfaced on validation/runtime errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    /// URI reference identifying the problem type.
    pub kind: String,
    /// Short, human-readable summary of the issue.
    pub title: String,
    /// HTTP status code associated with the error.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    /// Detailed diagnostic message when available.
    pub detail: Option<String>,
}

/// Test-fixture body for creating a synthetic completed torrent.
/// Compiled in only behind the `test-fixtures` feature (§6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateCompletedTorrentFixture {
    /// Name the fixture torrent should be visible under.
    pub name: String,
}

/// Test-fixture body for creating a synthetic packaged torrent with chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePackagedTorrentFixture {
    /// Name the fixture torrent should be visible under.
    pub name: String,
    /// Chunk files to seed for the fixture torrent.
    pub files: Vec<PackageFileDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_file_listing_accepts_structured_shape() {
        let json = r#"[{"filename":"a.tar.0000","filesize":10,"sha256":"abc"}]"#;
        let listing: PackageFileListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.0[0].filename, "a.tar.0000");
        assert_eq!(listing.0[0].filesize, Some(10));
    }

    #[test]
    fn package_file_listing_accepts_legacy_filename_array() {
        let json = r#"["a.tar.0000", "a.tar.0001"]"#;
        let listing: PackageFileListing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.0.len(), 2);
        assert!(listing.0.iter().all(|f| f.filesize.is_none() && f.sha256.is_none()));
    }

    #[test]
    fn token_auth_round_trips() {
        let request = TokenAuthRequest {
            username: "dasd".to_string(),
            password: "secret".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: TokenAuthRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }
}
