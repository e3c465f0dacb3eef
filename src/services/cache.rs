use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use uuid::Uuid;

use crate::config::CacheConfig;
use crate::services::tenancy::TenantScope;

/// Per-accessor read cache for `list` results, keyed by tenant scope.
///
/// Mutations invalidate before returning, so a `list` issued by the same
/// interaction always reloads. Invalidation is idempotent; invalidating a
/// key that is not cached is a no-op. Load failures are returned to the
/// caller and never cached, so a transient outage heals on the next read.
pub struct ListCache<T> {
    inner: Cache<TenantScope, Arc<Vec<T>>>,
}

impl<T: Clone + Send + Sync + 'static> ListCache<T> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(config.list_capacity)
                .time_to_live(Duration::from_secs(config.list_ttl_secs))
                .build(),
        }
    }

    pub async fn get_or_load<F, Fut, E>(
        &self,
        scope: TenantScope,
        load: F,
    ) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(hit) = self.inner.get(&scope).await {
            return Ok(hit);
        }

        let rows = Arc::new(load().await?);
        self.inner.insert(scope, rows.clone()).await;
        Ok(rows)
    }

    /// Drop the cached lists a tenant-scoped mutation can have gone stale:
    /// the tenant's own list and the cross-tenant master list.
    pub async fn invalidate_tenant(&self, church_id: Uuid) {
        self.inner.invalidate(&TenantScope::Church(church_id)).await;
        self.inner.invalidate(&TenantScope::All).await;
    }

    pub async fn invalidate_all(&self) {
        self.inner.invalidate(&TenantScope::All).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> ListCache<i32> {
        ListCache::new(&CacheConfig {
            list_ttl_secs: 60,
            list_capacity: 16,
        })
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = cache();
        let loads = AtomicUsize::new(0);
        let scope = TenantScope::Church(Uuid::new_v4());

        for _ in 0..3 {
            let rows = cache
                .get_or_load(scope, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(rows.as_slice(), &[1, 2, 3]);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_reload_and_is_idempotent() {
        let cache = cache();
        let church = Uuid::new_v4();
        let scope = TenantScope::Church(church);
        let loads = AtomicUsize::new(0);

        let load = |value: i32| {
            let loads = &loads;
            move || async move {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(vec![value])
            }
        };

        let first = cache.get_or_load(scope, load(1)).await.unwrap();
        assert_eq!(first.as_slice(), &[1]);

        // Repeated invalidation is a no-op beyond the first.
        cache.invalidate_tenant(church).await;
        cache.invalidate_tenant(church).await;

        let second = cache.get_or_load(scope, load(2)).await.unwrap();
        assert_eq!(second.as_slice(), &[2]);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn tenant_invalidation_also_drops_the_master_list() {
        let cache = cache();
        let church = Uuid::new_v4();
        let loads = AtomicUsize::new(0);

        let load = || {
            let loads = &loads;
            move || async move {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(vec![0])
            }
        };

        cache.get_or_load(TenantScope::All, load()).await.unwrap();
        cache.invalidate_tenant(church).await;
        cache.get_or_load(TenantScope::All, load()).await.unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_failures_are_not_cached() {
        let cache = cache();
        let scope = TenantScope::Church(Uuid::new_v4());

        let failed: Result<_, &str> = cache.get_or_load(scope, || async { Err("down") }).await;
        assert!(failed.is_err());

        let ok = cache
            .get_or_load(scope, || async { Ok::<_, &str>(vec![7]) })
            .await
            .unwrap();
        assert_eq!(ok.as_slice(), &[7]);
    }
}
