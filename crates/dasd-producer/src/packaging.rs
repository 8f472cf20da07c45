//! Bridges the `dasd-fsops` packaging pipeline (§4.1) to the `dasd-data`
//! repositories: the producer's own bookkeeping of which completed
//! torrents it has already packaged, grounded on
//! `dasdremote/dasdremote/torrent_package.py`'s `TorrentPackage` and
//! `views/torrents.py`'s `POST` handler from the original source.

use dasd_api_models::PackageFileDto;
use dasd_core::{PackageFile, Torrent, TORRENT_STAGES};
use dasd_data::PackageFileDraft;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `Torrent.stage` value a torrent sits at once its chunks exist and are
/// servable. The resting (odd-index) counterpart of `Packaging`.
const PACKAGED_STAGE: &str = "Packaged";

/// `PackageFile.stage` value assigned to chunks the producer has on disk
/// and ready to serve; the producer doesn't drive these through the
/// consumer's download/extract lifecycle, so they simply sit at this one
/// resting stage once created.
const READY_STAGE: &str = "Added";

/// Idempotently package `torrent_name`: if it's already packaged, return
/// the existing listing; otherwise run the packaging pipeline and record
/// the result. Mirrors the original `views/torrents.py` `POST` handler's
/// semantics, adapted to persist the outcome instead of recomputing it on
/// every request.
///
/// # Errors
///
/// Returns [`ApiError::not_found`] if the source directory doesn't exist,
/// or [`ApiError::internal`] if packaging or persistence fails.
pub async fn package_torrent(state: &AppState, torrent_name: &str) -> ApiResult<Vec<PackageFileDto>> {
    if let Some(torrent) = state.store.fetch_by_name(torrent_name).await? {
        if torrent.stage == PACKAGED_STAGE {
            return Ok(listing(&state.store.fetch_by_torrent(torrent.id).await?));
        }
    }

    let source = state.source_root.path.join(torrent_name);
    if !source.exists() {
        return Err(ApiError::not_found().with_detail(format!("no completed torrent named {torrent_name}")));
    }

    let uid = dasd_fsops::permissions::uid_for_user(&state.package_files.owner).ok();
    let gid = dasd_fsops::permissions::gid_for_group(&state.package_files.group).ok();
    dasd_fsops::permissions::mkdir_chownmod(&state.package_files.path, uid, gid, state.package_files.dmode)?;

    let drafts = dasd_fsops::create_package(&source, &state.package_files.path, state.package_options)?;
    let chunk_count = drafts.len();

    let torrent = match state.store.fetch_by_name(torrent_name).await? {
        Some(existing) => existing,
        None => state.store.create_torrent(torrent_name, TORRENT_STAGES.initial().name()).await?,
    };

    let data_drafts: Vec<PackageFileDraft> = drafts
        .into_iter()
        .map(|draft| PackageFileDraft {
            filename: draft.filename,
            filesize: i64::try_from(draft.filesize).ok(),
            sha256: Some(draft.sha256),
        })
        .collect();

    let created = state
        .store
        .create_package_files(torrent.id, &data_drafts, READY_STAGE)
        .await?;
    state
        .store
        .set_package_files_count(torrent.id, i64::try_from(chunk_count).unwrap_or(i64::MAX))
        .await?;
    state.store.advance_torrent_stage(torrent.id, PACKAGED_STAGE).await?;

    Ok(listing(&created))
}

/// The listing for an already-packaged torrent, or `None` if it isn't
/// packaged yet (including if it's entirely unknown).
///
/// # Errors
///
/// Propagates persistence failures.
pub async fn existing_listing(state: &AppState, torrent_name: &str) -> ApiResult<Option<Vec<PackageFileDto>>> {
    let Some(torrent) = state.store.fetch_by_name(torrent_name).await? else {
        return Ok(None);
    };
    if torrent.stage != PACKAGED_STAGE {
        return Ok(None);
    }
    Ok(Some(listing(&state.store.fetch_by_torrent(torrent.id).await?)))
}

/// Names of every torrent currently packaged, oldest first.
///
/// # Errors
///
/// Propagates persistence failures.
pub async fn packaged_names(state: &AppState) -> ApiResult<Vec<String>> {
    let torrents: Vec<Torrent> = state.store.fetch_ready_torrents(PACKAGED_STAGE).await?;
    Ok(torrents.into_iter().map(|torrent| torrent.name).collect())
}

fn listing(rows: &[PackageFile]) -> Vec<PackageFileDto> {
    rows.iter()
        .map(|row| PackageFileDto {
            filename: row.filename.clone(),
            filesize: row.filesize,
            sha256: row.sha256.clone(),
        })
        .collect()
}
