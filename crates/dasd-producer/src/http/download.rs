//! `GET`/`DELETE /download/<filename>/` (§6), grounded on
//! `dasdremote/dasdremote/views/download.py` from the original source: a
//! flat directory of packaged chunks, served with HTTP range support.

use std::path::PathBuf;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Stream one chunk file under the requested byte range as `206 Partial Content`.
pub async fn get_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let path = chunk_path(&state, &filename)?;
    let metadata = tokio::fs::metadata(&path).await.map_err(|_source| ApiError::not_found())?;
    let file_size = metadata.len();

    let range_header = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(ApiError::bad_request)?;
    let (start, end) = parse_range(range_header, file_size).ok_or_else(ApiError::bad_request)?;

    let mut file = tokio::fs::File::open(&path).await.map_err(|_source| ApiError::not_found())?;
    file.seek(std::io::SeekFrom::Start(start))
        .await
        .map_err(|_source| ApiError::internal())?;
    let length = end - start + 1;
    let stream = tokio_util::io::ReaderStream::new(file.take(length));

    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_LENGTH, length)
        .header(header::CONTENT_RANGE, format!("bytes {start}-{end}/{file_size}"))
        .header(header::ACCEPT_RANGES, "bytes")
        .body(Body::from_stream(stream))
        .map_err(|_source| ApiError::internal())
}

/// Remove one chunk file.
pub async fn delete_download(State(state): State<AppState>, Path(filename): Path<String>) -> ApiResult<StatusCode> {
    let path = chunk_path(&state, &filename)?;
    tokio::fs::remove_file(&path).await.map_err(|_source| ApiError::not_found())?;
    Ok(StatusCode::NO_CONTENT)
}

fn chunk_path(state: &AppState, filename: &str) -> ApiResult<PathBuf> {
    if is_invalid_filename(filename) {
        return Err(ApiError::bad_request().with_detail("invalid chunk filename"));
    }
    Ok(state.package_files.path.join(filename))
}

fn is_invalid_filename(filename: &str) -> bool {
    filename.is_empty() || filename.contains('/') || filename == ".."
}

fn parse_range(header_value: &str, file_size: u64) -> Option<(u64, u64)> {
    let spec = header_value.strip_prefix("bytes=")?;
    let (start_str, end_str) = spec.split_once('-')?;
    let start: u64 = start_str.parse().ok()?;
    let end = if end_str.is_empty() {
        file_size.checked_sub(1)?
    } else {
        end_str.parse().ok()?
    };
    if start > end || end >= file_size {
        return None;
    }
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_open_ended_range() {
        assert_eq!(parse_range("bytes=10-", 100), Some((10, 99)));
    }

    #[test]
    fn parses_closed_range() {
        assert_eq!(parse_range("bytes=10-19", 100), Some((10, 19)));
    }

    #[test]
    fn rejects_out_of_bounds_range() {
        assert_eq!(parse_range("bytes=0-199", 100), None);
        assert_eq!(parse_range("bytes=50-10", 100), None);
    }

    #[test]
    fn rejects_malformed_range() {
        assert_eq!(parse_range("nonsense", 100), None);
    }

    #[test]
    fn rejects_path_traversal_and_empty_filenames() {
        assert!(is_invalid_filename(".."));
        assert!(is_invalid_filename("a/b"));
        assert!(is_invalid_filename(""));
        assert!(!is_invalid_filename("release.tar.0000"));
    }
}
