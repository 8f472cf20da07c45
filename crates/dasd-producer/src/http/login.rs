//! `POST /auth/api-token-auth/` (§6): the one unauthenticated endpoint.

use axum::Json;
use axum::extract::State;

use dasd_api_models::{TokenAuthRequest, TokenAuthResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<TokenAuthRequest>,
) -> ApiResult<Json<TokenAuthResponse>> {
    let token = state
        .auth
        .login(&request.username, &request.password)
        .await
        .ok_or_else(ApiError::unauthorized)?;
    Ok(Json(TokenAuthResponse { token }))
}
