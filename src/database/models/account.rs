use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Auth-provider identity record. Distinct from [`super::Profile`], which is
/// the application-level user record provisioned lazily on first sign-in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
}
