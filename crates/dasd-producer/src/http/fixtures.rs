//! Test-fixture endpoints (§6), compiled in only behind the `test-fixtures`
//! feature: let an end-to-end test seed producer state without touching the
//! filesystem or running the packaging pipeline.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use dasd_api_models::{CreateCompletedTorrentFixture, CreatePackagedTorrentFixture};
use dasd_core::TORRENT_STAGES;
use dasd_data::PackageFileDraft;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Drop an empty directory under the source root, as if a torrent had just finished.
pub async fn create_completed_torrent(
    State(state): State<AppState>,
    Json(fixture): Json<CreateCompletedTorrentFixture>,
) -> ApiResult<StatusCode> {
    let path = state.source_root.path.join(&fixture.name);
    tokio::fs::create_dir_all(&path)
        .await
        .map_err(|source| ApiError::internal().with_detail(source.to_string()))?;
    Ok(StatusCode::CREATED)
}

/// Directly record a torrent as packaged, with the given chunk rows, bypassing packaging.
pub async fn create_packaged_torrent(
    State(state): State<AppState>,
    Json(fixture): Json<CreatePackagedTorrentFixture>,
) -> ApiResult<StatusCode> {
    let torrent = match state.store.fetch_by_name(&fixture.name).await? {
        Some(existing) => existing,
        None => {
            state
                .store
                .create_torrent(&fixture.name, TORRENT_STAGES.initial().name())
                .await?
        }
    };

    let drafts: Vec<PackageFileDraft> = fixture
        .files
        .into_iter()
        .map(|file| PackageFileDraft {
            filename: file.filename,
            filesize: file.filesize,
            sha256: file.sha256,
        })
        .collect();
    let count = drafts.len();
    state.store.create_package_files(torrent.id, &drafts, "Added").await?;
    state
        .store
        .set_package_files_count(torrent.id, i64::try_from(count).unwrap_or(i64::MAX))
        .await?;
    state.store.advance_torrent_stage(torrent.id, "Packaged").await?;

    Ok(StatusCode::CREATED)
}
