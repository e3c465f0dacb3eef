use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::accessors::FieldErrors;
use crate::state::AppState;

use super::token_payload;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// POST /auth/signup - register an account; opens a session immediately
/// unless the environment requires email confirmation first
pub async fn signup(
    State(state): State<AppState>,
    axum::Json(payload): axum::Json<SignUpRequest>,
) -> ApiResult<Value> {
    let mut errors = FieldErrors::new();
    if payload.name.trim().is_empty() {
        errors.insert("name".to_string(), "Campo obrigatório".to_string());
    }
    if payload.email.trim().is_empty() {
        errors.insert("email".to_string(), "Campo obrigatório".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::validation_error("Dados inválidos", Some(errors)));
    }

    let outcome = state
        .auth
        .sign_up(&payload.email, &payload.password, Some(payload.name.trim()))
        .await?;

    if outcome.confirmation_required {
        return Ok(ApiResponse::created(json!({
            "user": { "id": outcome.user_id, "email": outcome.email },
            "confirmation_required": true,
            "message": "Verifique seu email para confirmar a conta.",
        })));
    }

    let tokens = outcome
        .tokens
        .expect("session is opened when confirmation is not required");
    let profile = state
        .profiles
        .fetch(tokens.identity.user_id)
        .await
        .ok()
        .flatten();

    Ok(ApiResponse::created(token_payload(&tokens, profile.as_ref())))
}
