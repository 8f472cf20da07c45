//! `GET`/`POST /torrents/` (§6), grounded on
//! `dasdremote/dasdremote/views/torrents.py` from the original source.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use dasd_api_models::{PackageFileListing, TorrentNameRequest, TorrentNamesResponse};

use crate::error::{ApiError, ApiResult};
use crate::packaging;
use crate::state::AppState;

/// With no body, the names of every packaged torrent. With a `{torrent}`
/// body, that torrent's chunk listing, or 404 if it isn't packaged.
pub async fn get_torrents(
    State(state): State<AppState>,
    body: Option<Json<TorrentNameRequest>>,
) -> ApiResult<Response> {
    match body {
        None => {
            let names = packaging::packaged_names(&state).await?;
            Ok(Json(TorrentNamesResponse(names)).into_response())
        }
        Some(Json(request)) => {
            let files = packaging::existing_listing(&state, &request.torrent)
                .await?
                .ok_or_else(ApiError::not_found)?;
            Ok(Json(PackageFileListing(files)).into_response())
        }
    }
}

/// Package (or return the already-packaged listing for) the named torrent.
pub async fn post_torrents(
    State(state): State<AppState>,
    Json(request): Json<TorrentNameRequest>,
) -> ApiResult<Json<PackageFileListing>> {
    let files = packaging::package_torrent(&state, &request.torrent).await?;
    Ok(Json(PackageFileListing(files)))
}
