use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A tenant: the unit of data isolation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Church {
    pub id: Uuid,
    pub name: String,
    pub cnpj: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `church_finance_stats` aggregate view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChurchStats {
    pub church_id: Uuid,
    pub church_name: String,
    pub members_count: i64,
    pub balance: Decimal,
}

/// Church plus its best-effort denormalized aggregates. `members_count` and
/// `total_finance` are zeroed when the aggregate view is not queryable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurchOverview {
    pub id: Uuid,
    pub name: String,
    pub cnpj: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub members_count: i64,
    pub total_finance: Decimal,
}

impl ChurchOverview {
    pub fn from_church(church: Church, stats: Option<&ChurchStats>) -> Self {
        Self {
            id: church.id,
            name: church.name,
            cnpj: church.cnpj,
            email: church.email,
            phone: church.phone,
            address: church.address,
            created_at: church.created_at,
            updated_at: church.updated_at,
            members_count: stats.map(|s| s.members_count).unwrap_or(0),
            total_finance: stats.map(|s| s.balance).unwrap_or_default(),
        }
    }
}
