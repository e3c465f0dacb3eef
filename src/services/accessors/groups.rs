use std::sync::Arc;

use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::database::models::Group;
use crate::services::accessors::{require, FieldErrors};
use crate::services::cache::ListCache;
use crate::services::tenancy::TenantScope;

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub church_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewGroup {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name);
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Tenant-scoped group access. Listing prefers the `group_member_counts`
/// view; when the view is not queryable the plain table is served with
/// zeroed counts, so `members_count` is best-effort by contract.
pub struct GroupAccessor {
    pool: PgPool,
    cache: ListCache<Group>,
}

impl GroupAccessor {
    pub fn new(pool: PgPool, cache: &CacheConfig) -> Self {
        Self {
            pool,
            cache: ListCache::new(cache),
        }
    }

    pub async fn list(&self, scope: TenantScope) -> Arc<Vec<Group>> {
        if scope == TenantScope::Unassigned {
            return Arc::new(Vec::new());
        }

        let pool = &self.pool;
        let result = self
            .cache
            .get_or_load(scope, || async move {
                let from_view = sqlx::query_as::<_, Group>(
                    "SELECT id, church_id, name, description, members_count, created_at, updated_at
                     FROM group_member_counts
                     WHERE ($1::uuid IS NULL OR church_id = $1)
                     ORDER BY created_at DESC",
                )
                .bind(scope.church_id())
                .fetch_all(pool)
                .await;

                match from_view {
                    Ok(rows) => Ok(rows),
                    Err(e) => {
                        warn!("group_member_counts not queryable, serving zeroed counts: {}", e);
                        sqlx::query_as::<_, Group>(
                            "SELECT id, church_id, name, description, 0::bigint AS members_count,
                                    created_at, updated_at
                             FROM groups
                             WHERE ($1::uuid IS NULL OR church_id = $1)
                             ORDER BY created_at DESC",
                        )
                        .bind(scope.church_id())
                        .fetch_all(pool)
                        .await
                    }
                }
            })
            .await;

        match result {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Listing groups failed, serving empty list: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    pub async fn create(&self, church_id: Uuid, payload: NewGroup) -> Result<Group, sqlx::Error> {
        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO groups (church_id, name, description)
             VALUES ($1, $2, $3)
             RETURNING id, church_id, name, description, 0::bigint AS members_count,
                       created_at, updated_at",
        )
        .bind(church_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .fetch_one(&self.pool)
        .await?;

        self.cache.invalidate_tenant(group.church_id).await;
        Ok(group)
    }

    pub async fn update(
        &self,
        scope: TenantScope,
        id: Uuid,
        patch: GroupPatch,
    ) -> Result<Group, sqlx::Error> {
        if scope == TenantScope::Unassigned {
            return Err(sqlx::Error::RowNotFound);
        }

        let group = sqlx::query_as::<_, Group>(
            "UPDATE groups SET
                 name = COALESCE($3, name),
                 description = COALESCE($4, description),
                 updated_at = now()
             WHERE id = $1 AND ($2::uuid IS NULL OR church_id = $2)
             RETURNING id, church_id, name, description,
                       (SELECT count(*) FROM group_members gm WHERE gm.group_id = groups.id)
                           AS members_count,
                       created_at, updated_at",
        )
        .bind(id)
        .bind(scope.church_id())
        .bind(&patch.name)
        .bind(&patch.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        self.cache.invalidate_tenant(group.church_id).await;
        Ok(group)
    }

    pub async fn delete(&self, scope: TenantScope, id: Uuid) -> Result<(), sqlx::Error> {
        if scope == TenantScope::Unassigned {
            return Err(sqlx::Error::RowNotFound);
        }

        let deleted = sqlx::query_as::<_, (Uuid,)>(
            "DELETE FROM groups
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

    #[test]
    fn group_requires_a_name() {
        let payload = NewGroup {
            church_id: None,
            name: "  ".to_string(),
            description: String::new(),
        };
        assert!(payload.validate().contains_key("name"));
    }
}
