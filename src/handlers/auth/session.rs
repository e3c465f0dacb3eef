use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::{require_bearer, token_payload};

/// GET /auth/session - current identity and profile for the bearer token
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let token = require_bearer(&headers)?;
    let (identity, profile) = state.auth.current_identity(&token).await?;

    Ok(ApiResponse::success(json!({
        "user": {
            "id": identity.user_id,
            "email": identity.email,
            "name": identity.name,
        },
        "profile": profile,
    })))
}

/// PUT /auth/session - extend the session and issue a fresh token
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let token = require_bearer(&headers)?;
    let tokens = state.auth.refresh(&token).await?;

    Ok(ApiResponse::success(token_payload(&tokens, None)))
}

/// DELETE /auth/session - sign out, destroying the session row
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let token = require_bearer(&headers)?;
    state.auth.sign_out(&token).await?;

    Ok(ApiResponse::success(json!({ "signed_out": true })))
}
