use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::auth::is_valid_email;
use crate::config::CacheConfig;
use crate::database::models::{Church, ChurchOverview, ChurchStats};
use crate::services::accessors::{require, FieldErrors};
use crate::services::cache::ListCache;
use crate::services::tenancy::TenantScope;

const CHURCH_COLUMNS: &str = "id, name, cnpj, email, phone, address, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewChurch {
    pub name: String,
    pub cnpj: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl NewChurch {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "phone", &self.phone);
        require(&mut errors, "address", &self.address);
        if !is_valid_email(&self.email) {
            errors.insert("email".to_string(), "Email inválido".to_string());
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChurchPatch {
    pub name: Option<String>,
    pub cnpj: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Tenant registry access, master-facing. Listing decorates each church with
/// `members_count`/`total_finance` from the `church_finance_stats` view;
/// when the view is not queryable the aggregates are zeroed, never fatal.
pub struct ChurchAccessor {
    pool: PgPool,
    cache: ListCache<ChurchOverview>,
}

impl ChurchAccessor {
    pub fn new(pool: PgPool, cache: &CacheConfig) -> Self {
        Self {
            pool,
            cache: ListCache::new(cache),
        }
    }

    /// All churches, name ascending, with best-effort aggregates.
    pub async fn list(&self) -> Arc<Vec<ChurchOverview>> {
        let pool = &self.pool;
        let result = self
            .cache
            .get_or_load(TenantScope::All, || async move {
                let churches = sqlx::query_as::<_, Church>(&format!(
                    "SELECT {CHURCH_COLUMNS} FROM churches ORDER BY name ASC"
                ))
                .fetch_all(pool)
                .await?;

                let stats = Self::load_stats(pool).await;
                Ok::<_, sqlx::Error>(
                    churches
                        .into_iter()
                        .map(|c| {
                            let s = stats.get(&c.id);
                            ChurchOverview::from_church(c, s)
                        })
                        .collect(),
                )
            })
            .await;

        match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Listing churches failed, serving empty list: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    /// Aggregate view read, collapsed to an empty map on failure so callers
    /// only ever see zeroed aggregates, not an error.
    async fn load_stats(pool: &PgPool) -> HashMap<Uuid, ChurchStats> {
        let rows = sqlx::query_as::<_, ChurchStats>(
            "SELECT church_id, church_name, members_count, balance FROM church_finance_stats",
        )
        .fetch_all(pool)
        .await;

        match rows {
            Ok(rows) => rows.into_iter().map(|s| (s.church_id, s)).collect(),
            Err(e) => {
                warn!("church_finance_stats not queryable, zeroing aggregates: {}", e);
                HashMap::new()
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<ChurchOverview, sqlx::Error> {
        let church = sqlx::query_as::<_, Church>(&format!(
            "SELECT {CHURCH_COLUMNS} FROM churches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        let stats = Self::load_stats(&self.pool).await;
        Ok(ChurchOverview::from_church(church, stats.get(&id)))
    }

    pub async fn create(&self, payload: NewChurch) -> Result<Church, sqlx::Error> {
        let church = sqlx::query_as::<_, Church>(&format!(
            "INSERT INTO churches (name, cnpj, email, phone, address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CHURCH_COLUMNS}"
        ))
        .bind(&payload.name)
        .bind(&payload.cnpj)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(&payload.address)
        .fetch_one(&self.pool)
        .await?;

        self.cache.invalidate_all().await;
        Ok(church)
    }

    pub async fn update(&self, id: Uuid, patch: ChurchPatch) -> Result<Church, sqlx::Error> {
        let church = sqlx::query_as::<_, Church>(&format!(
            "UPDATE churches SET
                 name = COALESCE($2, name),
                 cnpj = COALESCE($3, cnpj),
                 email = COALESCE($4, email),
                 phone = COALESCE($5, phone),
                 address = COALESCE($6, address),
                 updated_at = now()
             WHERE id = $1
             RETURNING {CHURCH_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.cnpj)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(&patch.address)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        self.cache.invalidate_all().await;
        Ok(church)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), sqlx::Error> {
        let deleted = sqlx::query("DELETE FROM churches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        self.cache.invalidate_all().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::manager::test_support::unreachable_pool;

    fn payload() -> NewChurch {
        NewChurch {
            name: "Igreja Central".to_string(),
            cnpj: None,
            email: "contato@central.org".to_string(),
            phone: "(11) 3333-0000".to_string(),
            address: "Av. Principal, 100".to_string(),
        }
    }

    #[test]
    fn valid_church_passes() {
        assert!(payload().validate().is_empty());
    }

    #[test]
    fn church_requires_contact_fields() {
        let mut p = payload();
        p.name.clear();
        p.email = "nope".to_string();
        let errors = p.validate();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_empty_list() {
        let accessor = ChurchAccessor::new(
            unreachable_pool(),
            &CacheConfig {
                list_ttl_secs: 60,
                list_capacity: 16,
            },
        );
        assert!(accessor.list().await.is_empty());
    }
}
