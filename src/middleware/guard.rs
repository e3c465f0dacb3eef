use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::error;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::services::tenancy::{self, TenantScope};
use crate::state::AppState;

/// Caller context injected by [`require_session`] for downstream handlers.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub email: String,
    pub scope: TenantScope,
}

/// Route-guard states. `Loading` means the session could not be resolved at
/// all (storage unreachable); the other two are terminal for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated,
    Authenticated { master: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Resolution did not complete; the caller should come back.
    Wait,
    RedirectToLogin,
    RedirectToAdmin,
    Allow,
}

/// Transition rule: unauthenticated traffic goes to the sign-in surface;
/// master-only routes bounce non-master callers to the tenant surface.
pub fn decide(state: GuardState, master_only: bool) -> GuardOutcome {
    match state {
        GuardState::Loading => GuardOutcome::Wait,
        GuardState::Unauthenticated => GuardOutcome::RedirectToLogin,
        GuardState::Authenticated { master } => {
            if master_only && !master {
                GuardOutcome::RedirectToAdmin
            } else {
                GuardOutcome::Allow
            }
        }
    }
}

fn respond(outcome: GuardOutcome) -> Option<Response> {
    match outcome {
        GuardOutcome::Allow => None,
        GuardOutcome::RedirectToLogin => Some(Redirect::to("/login").into_response()),
        GuardOutcome::RedirectToAdmin => Some(Redirect::to("/admin").into_response()),
        GuardOutcome::Wait => Some(
            ApiError::service_unavailable("Session could not be resolved").into_response(),
        ),
    }
}

/// Extract the bearer token from the Authorization header
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))?;

    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

/// Session guard: one resolution attempt per request, no retry. A missing or
/// dead token is `Unauthenticated`; unreachable storage keeps the guard in
/// `Loading`. Successful resolution injects [`CurrentUser`].
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(request.headers()) else {
        return respond(decide(GuardState::Unauthenticated, false))
            .expect("unauthenticated always responds");
    };

    let identity = match state.auth.authenticate(&token).await {
        Ok(identity) => identity,
        Err(AuthError::Database(e)) => {
            error!("Session resolution failed: {}", e);
            return respond(decide(GuardState::Loading, false)).expect("loading always responds");
        }
        Err(_) => {
            return respond(decide(GuardState::Unauthenticated, false))
                .expect("unauthenticated always responds");
        }
    };

    let scope = match tenancy::resolve_scope(&state.pool, identity.user_id).await {
        Ok(scope) => scope,
        Err(e) => {
            error!("Tenant resolution failed: {}", e);
            return respond(decide(GuardState::Loading, false)).expect("loading always responds");
        }
    };

    request.extensions_mut().insert(CurrentUser {
        user_id: identity.user_id,
        email: identity.email,
        scope,
    });

    next.run(request).await
}

/// Master gate, layered inside [`require_session`] on `/master` routes.
pub async fn require_master(request: Request, next: Next) -> Response {
    let guard_state = match request.extensions().get::<CurrentUser>() {
        Some(user) => GuardState::Authenticated {
            master: user.scope.is_master(),
        },
        None => GuardState::Unauthenticated,
    };

    if let Some(response) = respond(decide(guard_state, true)) {
        return response;
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn guard_state_machine() {
        // Unauthenticated access always lands on the sign-in surface.
        assert_eq!(
            decide(GuardState::Unauthenticated, false),
            GuardOutcome::RedirectToLogin
        );
        assert_eq!(
            decide(GuardState::Unauthenticated, true),
            GuardOutcome::RedirectToLogin
        );

        // Non-master callers bounce off master-only routes to /admin.
        assert_eq!(
            decide(GuardState::Authenticated { master: false }, true),
            GuardOutcome::RedirectToAdmin
        );
        assert_eq!(
            decide(GuardState::Authenticated { master: true }, true),
            GuardOutcome::Allow
        );
        assert_eq!(
            decide(GuardState::Authenticated { master: false }, false),
            GuardOutcome::Allow
        );

        // Unresolved sessions wait; they are never redirected.
        assert_eq!(decide(GuardState::Loading, false), GuardOutcome::Wait);
        assert_eq!(decide(GuardState::Loading, true), GuardOutcome::Wait);
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123".to_string()));

        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
