use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::auth::is_valid_email;
use crate::config::CacheConfig;
use crate::database::models::member::{Member, MEMBER_STATUSES};
use crate::services::accessors::{require, require_one_of, FieldErrors};
use crate::services::cache::ListCache;
use crate::services::tenancy::TenantScope;

const MEMBER_COLUMNS: &str = "id, church_id, name, cpf, email, phone, birth_date, address, \
                              status, joined_at, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewMember {
    /// Only honored for master callers; tenant-scoped callers always write
    /// into their own church.
    pub church_id: Option<Uuid>,
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub address: String,
    pub status: Option<String>,
    pub joined_at: Option<NaiveDate>,
}

impl NewMember {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "cpf", &self.cpf);
        require(&mut errors, "phone", &self.phone);
        require(&mut errors, "address", &self.address);
        if !is_valid_email(&self.email) {
            errors.insert("email".to_string(), "Email inválido".to_string());
        }
        if let Some(status) = &self.status {
            require_one_of(&mut errors, "status", status, MEMBER_STATUSES);
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub address: Option<String>,
    pub status: Option<String>,
    pub joined_at: Option<NaiveDate>,
}

impl MemberPatch {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                errors.insert("email".to_string(), "Email inválido".to_string());
            }
        }
        if let Some(status) = &self.status {
            require_one_of(&mut errors, "status", status, MEMBER_STATUSES);
        }
        errors
    }
}

/// Tenant-scoped roster access. Reads go through a scope-keyed cache that
/// every mutation invalidates before returning.
pub struct MemberAccessor {
    pool: PgPool,
    cache: ListCache<Member>,
}

impl MemberAccessor {
    pub fn new(pool: PgPool, cache: &CacheConfig) -> Self {
        Self {
            pool,
            cache: ListCache::new(cache),
        }
    }

    /// All members within scope, newest first. Backend failures degrade to an
    /// empty roster so the surrounding surface stays usable; the failure is
    /// logged here and nowhere else.
    pub async fn list(&self, scope: TenantScope) -> Arc<Vec<Member>> {
        if scope == TenantScope::Unassigned {
            return Arc::new(Vec::new());
        }

        let pool = &self.pool;
        let result = self
            .cache
            .get_or_load(scope, || async move {
                sqlx::query_as::<_, Member>(&format!(
                    "SELECT {MEMBER_COLUMNS}
                     FROM members
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
                warn!("Listing members failed, serving empty roster: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    pub async fn create(&self, church_id: Uuid, payload: NewMember) -> Result<Member, sqlx::Error> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "INSERT INTO members (church_id, name, cpf, email, phone, birth_date, address, status, joined_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, 'ativo'), COALESCE($9, CURRENT_DATE))
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(church_id)
        .bind(&payload.name)
        .bind(&payload.cpf)
        .bind(&payload.email)
        .bind(&payload.phone)
        .bind(payload.birth_date)
        .bind(&payload.address)
        .bind(&payload.status)
        .bind(payload.joined_at)
        .fetch_one(&self.pool)
        .await?;

        self.cache.invalidate_tenant(member.church_id).await;
        Ok(member)
    }

    pub async fn update(
        &self,
        scope: TenantScope,
        id: Uuid,
        patch: MemberPatch,
    ) -> Result<Member, sqlx::Error> {
        if scope == TenantScope::Unassigned {
            return Err(sqlx::Error::RowNotFound);
        }

        let member = sqlx::query_as::<_, Member>(&format!(
            "UPDATE members SET
                 name = COALESCE($3, name),
                 cpf = COALESCE($4, cpf),
                 email = COALESCE($5, email),
                 phone = COALESCE($6, phone),
                 birth_date = COALESCE($7, birth_date),
                 address = COALESCE($8, address),
                 status = COALESCE($9, status),
                 joined_at = COALESCE($10, joined_at),
                 updated_at = now()
             WHERE id = $1 AND ($2::uuid IS NULL OR church_id = $2)
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(id)
        .bind(scope.church_id())
        .bind(&patch.name)
        .bind(&patch.cpf)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(patch.birth_date)
        .bind(&patch.address)
        .bind(&patch.status)
        .bind(patch.joined_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        self.cache.invalidate_tenant(member.church_id).await;
        Ok(member)
    }

    pub async fn delete(&self, scope: TenantScope, id: Uuid) -> Result<(), sqlx::Error> {
        if scope == TenantScope::Unassigned {
            return Err(sqlx::Error::RowNotFound);
        }

        let deleted = sqlx::query_as::<_, (Uuid,)>(
            "DELETE FROM members
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
    use crate::database::manager::test_support::unreachable_pool;

    fn payload() -> NewMember {
        NewMember {
            church_id: None,
            name: "João da Silva".to_string(),
            cpf: "123.456.789-00".to_string(),
            email: "joao@igreja.com".to_string(),
            phone: "(11) 99999-0000".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1980, 3, 14).unwrap(),
            address: "Rua das Flores, 10".to_string(),
            status: None,
            joined_at: None,
        }
    }

    fn cache_config() -> CacheConfig {
        CacheConfig {
            list_ttl_secs: 60,
            list_capacity: 16,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_empty());
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let mut p = payload();
        p.name.clear();
        p.email = "not-an-email".to_string();
        let errors = p.validate();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut p = payload();
        p.status = Some("desligado".to_string());
        assert!(p.validate().contains_key("status"));

        let patch = MemberPatch {
            status: Some("visitante".to_string()),
            ..Default::default()
        };
        assert!(patch.validate().is_empty());
    }

    #[tokio::test]
    async fn unassigned_scope_lists_nothing() {
        let accessor = MemberAccessor::new(unreachable_pool(), &cache_config());
        let rows = accessor.list(TenantScope::Unassigned).await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_empty_list() {
        let accessor = MemberAccessor::new(unreachable_pool(), &cache_config());
        let rows = accessor.list(TenantScope::Church(Uuid::new_v4())).await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn backend_failure_is_an_error_for_mutations() {
        let accessor = MemberAccessor::new(unreachable_pool(), &cache_config());
        let result = accessor
            .delete(TenantScope::All, Uuid::new_v4())
            .await;
        assert!(result.is_err());
    }
}
