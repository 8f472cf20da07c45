//! Route table assembly.

use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};

use crate::state::AppState;

use super::auth_middleware::require_token;
use super::download::{delete_download, get_download};
use super::login::login;
use super::torrents::{get_torrents, post_torrents};

/// Build the full producer router over the given application state.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/torrents/", get(get_torrents).post(post_torrents))
        .route("/download/{filename}/", get(get_download).delete(delete_download))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    let router = Router::new()
        .route("/auth/api-token-auth/", post(login))
        .merge(authenticated);

    #[cfg(feature = "test-fixtures")]
    let router = router.merge(fixture_routes());

    router.with_state(state)
}

#[cfg(feature = "test-fixtures")]
fn fixture_routes() -> Router<AppState> {
    Router::new()
        .route("/test/completed-torrents/", post(super::fixtures::create_completed_torrent))
        .route("/test/packaged-torrents/", post(super::fixtures::create_packaged_torrent))
}
