use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::token_payload;

/// GET /auth/google - bounce the browser to the provider's authorize endpoint
pub async fn google_redirect(State(state): State<AppState>) -> Response {
    match state.auth.google_authorize_url() {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// GET /auth/google/callback - exchange the authorization code, provision the
/// account and open a session
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> ApiResult<Value> {
    if let Some(error) = params.error {
        return Err(crate::auth::AuthError::Provider(error).into());
    }
    let code = params
        .code
        .ok_or_else(|| ApiError::bad_request("Missing authorization code"))?;

    let tokens = state.auth.google_callback(&code).await?;
    let profile = state
        .profiles
        .fetch(tokens.identity.user_id)
        .await
        .ok()
        .flatten();

    Ok(ApiResponse::success(token_payload(&tokens, profile.as_ref())))
}
