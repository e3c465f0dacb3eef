pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod session;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .route("/login", get(handlers::public::login_surface))
        // Public auth routes (token acquisition)
        .merge(auth_routes())
        // Tenant surface (session-guarded)
        .merge(admin_routes(state.clone()))
        // Master surface (session-guarded + master-gated)
        .merge(master_routes(state.clone()))
        .fallback(handlers::public::not_found)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/google", get(auth::google_redirect))
        .route("/auth/google/callback", get(auth::google_callback))
        .route(
            "/auth/session",
            get(auth::session).put(auth::refresh).delete(auth::logout),
        )
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use axum::routing::patch;
    use handlers::admin;

    Router::new()
        .route("/admin", get(admin::dashboard))
        .route(
            "/admin/members",
            get(admin::members::list).post(admin::members::create),
        )
        .route(
            "/admin/members/:id",
            patch(admin::members::update).delete(admin::members::remove),
        )
        .route(
            "/admin/finances",
            get(admin::finances::list).post(admin::finances::create),
        )
        .route(
            "/admin/finances/:id",
            patch(admin::finances::update).delete(admin::finances::remove),
        )
        .route(
            "/admin/events",
            get(admin::events::list).post(admin::events::create),
        )
        .route(
            "/admin/events/:id",
            patch(admin::events::update).delete(admin::events::remove),
        )
        .route(
            "/admin/groups",
            get(admin::groups::list).post(admin::groups::create),
        )
        .route(
            "/admin/groups/:id",
            patch(admin::groups::update).delete(admin::groups::remove),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ))
}

fn master_routes(state: AppState) -> Router<AppState> {
    use axum::routing::patch;
    use handlers::master;

    Router::new()
        .route("/master", get(master::dashboard))
        .route(
            "/master/churches",
            get(master::churches::list).post(master::churches::create),
        )
        .route(
            "/master/churches/:id",
            get(master::churches::get)
                .patch(master::churches::update)
                .delete(master::churches::remove),
        )
        .route("/master/analytics", get(master::analytics))
        // Layer order matters: the session guard (added last) runs first and
        // injects CurrentUser for the master gate.
        .route_layer(axum::middleware::from_fn(middleware::require_master))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ))
}

#[cfg(test)]
mod router_tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::database::manager::test_support::unreachable_pool;

    fn test_app() -> Router {
        app(AppState::new(unreachable_pool()))
    }

    async fn send(uri: &str) -> axum::response::Response {
        test_app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn root_and_login_surfaces_are_public() {
        assert_eq!(send("/").await.status(), StatusCode::OK);
        assert_eq!(send("/login").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_routes_fall_through_to_404() {
        assert_eq!(send("/nonexistent").await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unauthenticated_admin_traffic_redirects_to_login() {
        let response = send("/admin/members").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }

    #[tokio::test]
    async fn unauthenticated_master_traffic_redirects_to_login() {
        let response = send("/master").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_unauthenticated() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/admin")
                    .header("authorization", "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }
}
