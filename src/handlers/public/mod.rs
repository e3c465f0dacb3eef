use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Ecclesia API",
            "version": version,
            "description": "Multi-tenant church administration API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/login (public - sign-in surface)",
                "auth": "/auth/login, /auth/signup, /auth/google, /auth/session (public - token acquisition)",
                "admin": "/admin, /admin/{members,finances,events,groups} (protected - tenant surface)",
                "master": "/master, /master/churches, /master/analytics (protected - master only)",
            }
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match crate::database::health_check(&state.pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

/// Sign-in surface descriptor; the redirect target for unauthenticated
/// traffic bounced by the route guard.
pub async fn login_surface() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "message": "Entre com suas credenciais para acessar o sistema",
            "sign_in": { "method": "POST", "path": "/auth/login", "fields": ["email", "password"] },
            "sign_up": { "method": "POST", "path": "/auth/signup", "fields": ["email", "password", "name"] },
            "google": { "method": "GET", "path": "/auth/google" }
        }
    }))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Route not found",
            "code": "NOT_FOUND"
        })),
    )
}
