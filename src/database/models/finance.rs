use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ledger entry kinds: `entrada` credits the balance, `saida` debits it.
pub const FINANCE_TYPES: &[&str] = &["entrada", "saida"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Finance {
    pub id: Uuid,
    pub church_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Finance {
    /// Signed contribution of this entry to a balance.
    pub fn signed_amount(&self) -> Decimal {
        if self.kind == "saida" {
            -self.amount
        } else {
            self.amount
        }
    }
}
