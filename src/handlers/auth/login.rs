use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::accessors::FieldErrors;
use crate::state::AppState;

use super::token_payload;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - email/password sign-in, returns a bearer token
pub async fn login(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<LoginRequest>,
) -> ApiResult<Value> {
    // Form-level rules run before anything touches the auth service.
    let mut errors = FieldErrors::new();
    if payload.email.trim().is_empty() {
        errors.insert("email".to_string(), "Campo obrigatório".to_string());
    }
    if payload.password.is_empty() {
        errors.insert("password".to_string(), "Campo obrigatório".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Dados inválidos", Some(errors)));
    }

    let tokens = state.auth.sign_in(&payload.email, &payload.password).await?;
    let profile = state
        .profiles
        .fetch(tokens.identity.user_id)
        .await
        .ok()
        .flatten();

    Ok(ApiResponse::success(token_payload(&tokens, profile.as_ref())))
}
