use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::database::models::Event;
use crate::services::accessors::{require, FieldErrors};
use crate::services::cache::ListCache;
use crate::services::tenancy::TenantScope;

const EVENT_COLUMNS: &str =
    "id, church_id, name, description, date, time, location, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewEvent {
    pub church_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
}

impl NewEvent {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require(&mut errors, "name", &self.name);
        require(&mut errors, "location", &self.location);
        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
}

/// Tenant-scoped event calendar access.
pub struct EventAccessor {
    pool: PgPool,
    cache: ListCache<Event>,
}

impl EventAccessor {
    pub fn new(pool: PgPool, cache: &CacheConfig) -> Self {
        Self {
            pool,
            cache: ListCache::new(cache),
        }
    }

    pub async fn list(&self, scope: TenantScope) -> Arc<Vec<Event>> {
        if scope == TenantScope::Unassigned {
            return Arc::new(Vec::new());
        }

        let pool = &self.pool;
        let result = self
            .cache
            .get_or_load(scope, || async move {
                sqlx::query_as::<_, Event>(&format!(
                    "SELECT {EVENT_COLUMNS}
                     FROM events
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
                warn!("Listing events failed, serving empty agenda: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    pub async fn create(&self, church_id: Uuid, payload: NewEvent) -> Result<Event, sqlx::Error> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (church_id, name, description, date, time, location)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(church_id)
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.date)
        .bind(payload.time)
        .bind(&payload.location)
        .fetch_one(&self.pool)
        .await?;

        self.cache.invalidate_tenant(event.church_id).await;
        Ok(event)
    }

    pub async fn update(
        &self,
        scope: TenantScope,
        id: Uuid,
        patch: EventPatch,
    ) -> Result<Event, sqlx::Error> {
        if scope == TenantScope::Unassigned {
            return Err(sqlx::Error::RowNotFound);
        }

        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events SET
                 name = COALESCE($3, name),
                 description = COALESCE($4, description),
                 date = COALESCE($5, date),
                 time = COALESCE($6, time),
                 location = COALESCE($7, location),
                 updated_at = now()
             WHERE id = $1 AND ($2::uuid IS NULL OR church_id = $2)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(scope.church_id())
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.date)
        .bind(patch.time)
        .bind(&patch.location)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

        self.cache.invalidate_tenant(event.church_id).await;
        Ok(event)
    }

    pub async fn delete(&self, scope: TenantScope, id: Uuid) -> Result<(), sqlx::Error> {
        if scope == TenantScope::Unassigned {
            return Err(sqlx::Error::RowNotFound);
        }

        let deleted = sqlx::query_as::<_, (Uuid,)>(
            "DELETE FROM events
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
    fn event_requires_name_and_location() {
        let payload = NewEvent {
            church_id: None,
            name: String::new(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2025, 12, 24).unwrap(),
            time: NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            location: String::new(),
        };
        let errors = payload.validate();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("location"));
    }
}
