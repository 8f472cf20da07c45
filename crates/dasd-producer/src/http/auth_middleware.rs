//! Bearer-token guard applied to every route except login.

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Reject the request unless it carries a valid `Authorization: Token <t>` header.
pub async fn require_token(
    State(state): State<AppState>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(ApiError::unauthorized)?;

    if !state.auth.validate(header_value).await {
        return Err(ApiError::unauthorized());
    }

    Ok(next.run(request).await)
}
