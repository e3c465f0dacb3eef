use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::database::models::finance::{Finance, FINANCE_TYPES};
use crate::services::accessors::{require, require_one_of, FieldErrors};
use crate::services::cache::ListCache;
use crate::services::tenancy::TenantScope;

const FINANCE_COLUMNS: &str =
    "id, church_id, type, category, description, amount, date, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewFinance {
    pub church_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl NewFinance {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_one_of(&mut errors, "type", &self.kind, FINANCE_TYPES);
        require(&mut errors, "category", &self.category);
        if self.amount <= Decimal::ZERO {
            errors.insert(
                "amount".to_string(),
                "O valor deve ser maior que zero".to_string(),
            );
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FinancePatch {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
}

impl FinancePatch {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(kind) = &self.kind {
            require_one_of(&mut errors, "type", kind, FINANCE_TYPES);
        }
        if let Some(amount) = self.amount {
            if amount <= Decimal::ZERO {
                errors.insert(
                    "amount".to_string(),
                    "O valor deve ser maior que zero".to_string(),
                );
            }
        }
        errors
    }
}

/// Tenant-scoped ledger access.
pub struct FinanceAccessor {
    pool: PgPool,
    cache: ListCache<Finance>,
}

impl FinanceAccessor {
    pub fn new(pool: PgPool, cache: &CacheConfig) -> Self {
        Self {
            pool,
            cache: ListCache::new(cache),
        }
    }

    pub async fn list(&self, scope: TenantScope) -> Arc<Vec<Finance>> {
        if scope == TenantScope::Unassigned {
            return Arc::new(Vec::new());
        }

        let pool = &self.pool;
        let result = self
            .cache
            .get_or_load(scope, || async move {
                sqlx::query_as::<_, Finance>(&format!(
                    "SELECT {FINANCE_COLUMNS}
                     FROM finances
                     WHERE ($1::uuid IS NULL OR church_id = $1)
                     ORDER BY created_at DESC"
                ))
                .bind(scope.church_id())
                .fetch_all(pool)
                .await
            })
            .await;

        match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Listing finances failed, serving empty ledger: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    pub async fn create(
        &self,
        church_id: Uuid,
        payload: NewFinance,
    ) -> Result<Finance, sqlx::Error> {
        let entry = sqlx::query_as::<_, Finance>(&format!(
            "INSERT INTO finances (church_id, type, category, description, amount, date)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {FINANCE_COLUMNS}"
        ))
        .bind(church_id)
        .bind(&payload.kind)
        .bind(&payload.category)
        .bind(&payload.description)
        .bind(payload.amount)
        .bind(payload.date)
        .fetch_one(&self.pool)
        .await?;

        self.cache.invalidate_tenant(entry.church_id).await;
        Ok(entry)
    }

    pub async fn update(
        &self,
        scope: TenantScope,
        id: Uuid,
        patch: FinancePatch,
    ) -> Result<Finance, sqlx::Error> {
        if scope == TenantScope::Unassigned {
            return Err(sqlx::Error::RowNotFound);
        }

        let entry = sqlx::query_as::<_, Finance>(&format!(
            "UPDATE finances SET
                 type = COALESCE($3, type),
                 category = COALESCE($4, category),
                 description = COALESCE($5, description),
                 amount = COALESCE($6, amount),
                 date = COALESCE($7, date),
                 updated_at = now()
             WHERE id = $1 AND ($2::uuid IS NULL OR church_id = $2)
             RETURNING {FINANCE_COLUMNS}"
        ))
        .bind(id)
        .bind(scope.church_id())
        .bind(&patch.kind)
        .bind(&patch.category)
        .bind(&patch.description)
        .bind(patch.amount)
        .bind(patch.date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        self.cache.invalidate_tenant(entry.church_id).await;
        Ok(entry)
    }

    pub async fn delete(&self, scope: TenantScope, id: Uuid) -> Result<(), sqlx::Error> {
        if scope == TenantScope::Unassigned {
            return Err(sqlx::Error::RowNotFound);
        }

        let deleted = sqlx::query_as::<_, (Uuid,)>(
            "DELETE FROM finances
             WHERE id = $1 AND ($2::uuid IS NULL OR church_id = $2)
             RETURNING church_id",
        )
        .bind(id)
        .bind(scope.church_id())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        self.cache.invalidate_tenant(deleted.0).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> NewFinance {
        NewFinance {
            church_id: None,
            kind: "entrada".to_string(),
            category: "Dízimo".to_string(),
            description: String::new(),
            amount: Decimal::new(15000, 2), // 150.00
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn valid_entry_passes() {
        assert!(payload().validate().is_empty());
    }

    #[test]
    fn kind_must_be_entrada_or_saida() {
        let mut p = payload();
        p.kind = "transferencia".to_string();
        assert!(p.validate().contains_key("type"));
    }

    #[test]
    fn amount_must_be_positive() {
        let mut p = payload();
        p.amount = Decimal::ZERO;
        assert!(p.validate().contains_key("amount"));

        let patch = FinancePatch {
            amount: Some(Decimal::new(-100, 2)),
            ..Default::default()
        };
        assert!(patch.validate().contains_key("amount"));
    }
}
