mod login;
mod oauth;
mod session;
mod signup;

pub use login::login;
pub use oauth::{google_callback, google_redirect};
pub use session::{logout, refresh, session};
pub use signup::signup;

use axum::http::HeaderMap;
use serde_json::{json, Value};

use crate::database::models::Profile;
use crate::error::ApiError;
use crate::middleware::guard::bearer_token;
use crate::services::auth_service::AuthTokens;

/// Wire shape shared by every endpoint that issues a token.
pub(crate) fn token_payload(tokens: &AuthTokens, profile: Option<&Profile>) -> Value {
    json!({
        "token": tokens.token,
        "expires_at": tokens.expires_at,
        "user": {
            "id": tokens.identity.user_id,
            "email": tokens.identity.email,
            "name": tokens.identity.name,
        },
        "profile": profile,
    })
}

pub(crate) fn require_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    bearer_token(headers).ok_or_else(|| ApiError::unauthorized("Não autenticado."))
}
