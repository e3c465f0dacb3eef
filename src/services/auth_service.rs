use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::oauth::GoogleOAuth;
use crate::auth::{generate_jwt, hash_password, is_valid_email, validate_jwt, verify_password};
use crate::auth::{AuthError, Claims};
use crate::config;
use crate::database::models::{Account, Profile, Session};
use crate::services::profile::ProfileResolver;
use crate::session::{Identity, SessionChange, SessionStore};

const ACCOUNT_COLUMNS: &str = "id, email, name, password_hash, email_confirmed, created_at";

/// Issued session: bearer token plus the identity it belongs to.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub identity: Identity,
}

/// Result of a registration attempt. When confirmation is required no
/// session is opened; the caller is told to go confirm the address.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user_id: Uuid,
    pub email: String,
    pub confirmation_required: bool,
    pub tokens: Option<AuthTokens>,
}

/// Owns the auth-provider boundary: sign-in, sign-up, OAuth sign-in,
/// sign-out, refresh, and the session getter. Every successful transition is
/// converged into the session store, which is where profile provisioning
/// hangs off.
pub struct AuthService {
    pool: PgPool,
    store: Arc<SessionStore>,
    profiles: Arc<ProfileResolver>,
    oauth: GoogleOAuth,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        store: Arc<SessionStore>,
        profiles: Arc<ProfileResolver>,
        oauth: GoogleOAuth,
    ) -> Self {
        Self {
            pool,
            store,
            profiles,
            oauth,
        }
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }

        let min_len = config::config().security.min_password_length;
        if password.len() < min_len {
            return Err(AuthError::WeakPassword(min_len));
        }

        let phc = hash_password(password)?;
        let confirmed = !config::config().security.require_email_confirmation;

        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (id, email, name, password_hash, email_confirmed)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (email) DO NOTHING
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(name)
        .bind(&phc)
        .bind(confirmed)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::EmailTaken)?;

        if !account.email_confirmed {
            return Ok(SignUpOutcome {
                user_id: account.id,
                email: account.email,
                confirmation_required: true,
                tokens: None,
            });
        }

        let tokens = self.open_session(account).await?;
        Ok(SignUpOutcome {
            user_id: tokens.identity.user_id,
            email: tokens.identity.email.clone(),
            confirmation_required: false,
            tokens: Some(tokens),
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, AuthError> {
        let email = email.trim().to_lowercase();

        let account = self
            .fetch_account_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // OAuth-only accounts carry no password hash.
        let phc = account
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(phc, password) {
            return Err(AuthError::InvalidCredentials);
        }

        if !account.email_confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }

        self.open_session(account).await
    }

    /// Authorization URL for the single configured OAuth provider.
    pub fn google_authorize_url(&self) -> Result<String, AuthError> {
        if !self.oauth.is_configured() {
            return Err(AuthError::Provider(
                "Google sign-in is not configured".to_string(),
            ));
        }
        self.oauth.authorize_url()
    }

    /// Code-exchange half of the OAuth flow: provision-or-update the account
    /// from provider metadata, then open a session like any other sign-in.
    pub async fn google_callback(&self, code: &str) -> Result<AuthTokens, AuthError> {
        let provider = self.oauth.exchange_code(code).await?;
        let email = provider.email.trim().to_lowercase();

        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (id, email, name, password_hash, email_confirmed)
             VALUES ($1, $2, $3, NULL, true)
             ON CONFLICT (email) DO UPDATE
                 SET name = COALESCE(accounts.name, EXCLUDED.name),
                     email_confirmed = true
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&provider.name)
        .fetch_one(&self.pool)
        .await?;

        self.open_session(account).await
    }

    /// Extend the caller's session and issue a fresh token carrying the same
    /// session id. Feeds the store as a refresh, which must not re-trigger
    /// profile provisioning.
    pub async fn refresh(&self, token: &str) -> Result<AuthTokens, AuthError> {
        let claims = validate_jwt(token)?;
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let expires_at = Utc::now() + Duration::hours(expiry_hours as i64);

        let refreshed = sqlx::query_as::<_, (Uuid,)>(
            "UPDATE sessions SET expires_at = $2
             WHERE id = $1 AND expires_at > now()
             RETURNING user_id",
        )
        .bind(claims.jti)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::SessionRevoked)?;

        let account = self
            .fetch_account_by_id(refreshed.0)
            .await?
            .ok_or(AuthError::SessionRevoked)?;

        let new_claims = Claims::new(account.id, account.email.clone(), claims.jti);
        let token = generate_jwt(&new_claims)?;
        let identity = identity_of(&account);

        self.store
            .apply(SessionChange::Refreshed(identity.clone()))
            .await;

        Ok(AuthTokens {
            token,
            expires_at,
            identity,
        })
    }

    /// Destroy the session row; the token dies with it. Signing out an
    /// already-dead session is not an error.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        let claims = validate_jwt(token)?;

        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(claims.jti)
            .execute(&self.pool)
            .await?;

        self.store.apply(SessionChange::SignedOut).await;
        Ok(())
    }

    /// Validate the bearer token against both its signature and its session
    /// row. This is the single resolution attempt the route guard makes.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = validate_jwt(token)?;

        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, created_at, expires_at
             FROM sessions
             WHERE id = $1 AND expires_at > now()",
        )
        .bind(claims.jti)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::SessionRevoked)?;

        let account = self
            .fetch_account_by_id(session.user_id)
            .await?
            .ok_or(AuthError::SessionRevoked)?;

        Ok(identity_of(&account))
    }

    /// "Who am I": identity plus the application profile, if provisioned.
    pub async fn current_identity(
        &self,
        token: &str,
    ) -> Result<(Identity, Option<Profile>), AuthError> {
        let identity = self.authenticate(token).await?;
        let profile = self
            .profiles
            .fetch(identity.user_id)
            .await
            .ok()
            .flatten();
        Ok((identity, profile))
    }

    async fn open_session(&self, account: Account) -> Result<AuthTokens, AuthError> {
        let session_id = Uuid::new_v4();
        let claims = Claims::new(account.id, account.email.clone(), session_id);
        let expires_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(account.id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        let token = generate_jwt(&claims)?;
        let identity = identity_of(&account);

        self.store
            .apply(SessionChange::SignedIn(identity.clone()))
            .await;

        Ok(AuthTokens {
            token,
            expires_at,
            identity,
        })
    }

    async fn fetch_account_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn fetch_account_by_id(&self, id: Uuid) -> Result<Option<Account>, AuthError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }
}

fn identity_of(account: &Account) -> Identity {
    Identity {
        user_id: account.id,
        email: account.email.clone(),
        name: account.name.clone(),
    }
}
