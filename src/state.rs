use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::oauth::GoogleOAuth;
use crate::config;
use crate::services::accessors::Accessors;
use crate::services::auth_service::AuthService;
use crate::services::profile::ProfileResolver;
use crate::session::SessionStore;

/// Explicitly owned application context, cloned into every handler. Session
/// state lives here rather than in a process-wide singleton so tests and
/// multi-instance hosting can each build their own.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub session_store: Arc<SessionStore>,
    pub profiles: Arc<ProfileResolver>,
    pub auth: Arc<AuthService>,
    pub accessors: Arc<Accessors>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = config::config();

        let profiles = Arc::new(ProfileResolver::new(
            pool.clone(),
            config.security.master_email.clone(),
        ));
        let session_store = SessionStore::new(profiles.clone());
        let auth = Arc::new(AuthService::new(
            pool.clone(),
            session_store.clone(),
            profiles.clone(),
            GoogleOAuth::new(config.oauth.clone()),
        ));
        let accessors = Arc::new(Accessors::new(pool.clone(), &config.cache));

        Self {
            pool,
            session_store,
            profiles,
            auth,
            accessors,
        }
    }
}
