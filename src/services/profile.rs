use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{Profile, Role};
use crate::session::{Identity, ProvisionProfiles};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Profile for user {0} missing after provisioning")]
    MissingAfterProvision(Uuid),
}

/// Initial role for a freshly provisioned user: master iff the email equals
/// the configured master address, else an ordinary member with no tenant.
pub fn initial_role(email: &str, master_email: &str) -> Role {
    if email == master_email {
        Role::Master
    } else {
        Role::Member
    }
}

/// Display-name fallback chain: explicit/provider name, then the local part
/// of the email, then the literal placeholder.
pub fn display_name(name: Option<&str>, email: &str) -> String {
    if let Some(name) = name {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let local = email.split('@').next().unwrap_or("");
    if !local.is_empty() {
        return local.to_string();
    }
    "Usuário".to_string()
}

/// Deterministic avatar URL derived from the email (gravatar, SHA-256 form).
pub fn avatar_url(email: &str) -> String {
    let hash = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("https://www.gravatar.com/avatar/{:x}?d=identicon", hash)
}

/// Fetch-or-provision for application profiles.
///
/// Provisioning is an idempotent upsert: the insert uses
/// `ON CONFLICT DO NOTHING` and the row is re-fetched afterwards, so two
/// concurrent sign-ins for the same user both end up with a usable profile
/// and exactly one of them creates the initial role assignment.
pub struct ProfileResolver {
    pool: PgPool,
    master_email: String,
}

impl ProfileResolver {
    pub fn new(pool: PgPool, master_email: String) -> Self {
        Self { pool, master_email }
    }

    pub async fn fetch(&self, user_id: Uuid) -> Result<Option<Profile>, ProfileError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, name, avatar_url, created_at, updated_at
             FROM profiles
             WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn resolve(&self, identity: &Identity) -> Result<Profile, ProfileError> {
        if let Some(profile) = self.fetch(identity.user_id).await? {
            return Ok(profile);
        }

        let name = display_name(identity.name.as_deref(), &identity.email);
        let avatar = avatar_url(&identity.email);

        let inserted = sqlx::query(
            "INSERT INTO profiles (id, email, name, avatar_url)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(identity.user_id)
        .bind(&identity.email)
        .bind(&name)
        .bind(&avatar)
        .execute(&self.pool)
        .await?;

        // Only the insert winner seeds the role assignment; the loser of a
        // provisioning race falls through to the re-fetch below.
        if inserted.rows_affected() == 1 {
            self.assign_initial_role(identity).await?;
            info!("Provisioned profile for {}", identity.email);
        }

        self.fetch(identity.user_id)
            .await?
            .ok_or(ProfileError::MissingAfterProvision(identity.user_id))
    }

    async fn assign_initial_role(&self, identity: &Identity) -> Result<(), ProfileError> {
        let role = initial_role(&identity.email, &self.master_email);
        sqlx::query("INSERT INTO user_roles (user_id, church_id, role) VALUES ($1, NULL, $2)")
            .bind(identity.user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProvisionProfiles for ProfileResolver {
    async fn ensure_profile(&self, identity: &Identity) {
        // Auth state must never be poisoned by provisioning trouble; the next
        // resolve attempt (or any direct profile read) will retry naturally.
        if let Err(e) = self.resolve(identity).await {
            warn!("Profile provisioning failed for {}: {}", identity.email, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_email_gets_master_role() {
        let master = "yuriadrskt@gmail.com";
        assert_eq!(initial_role("yuriadrskt@gmail.com", master), Role::Master);
        assert_eq!(initial_role("pastor@igreja.com", master), Role::Member);
        // Exact comparison, as configured; case variants are different addresses.
        assert_eq!(initial_role("YURIADRSKT@GMAIL.COM", master), Role::Member);
    }

    #[test]
    fn display_name_fallback_chain() {
        assert_eq!(display_name(Some("Maria Souza"), "m@x.com"), "Maria Souza");
        assert_eq!(display_name(Some("  "), "maria@x.com"), "maria");
        assert_eq!(display_name(None, "maria@x.com"), "maria");
        assert_eq!(display_name(None, "@x.com"), "Usuário");
    }

    #[test]
    fn avatar_url_is_deterministic_and_normalized() {
        let a = avatar_url(" Maria@X.com ");
        let b = avatar_url("maria@x.com");
        assert_eq!(a, b);
        assert!(a.starts_with("https://www.gravatar.com/avatar/"));
    }
}
