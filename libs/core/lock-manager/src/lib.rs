// [libs/core/lock-manager/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DISTRIBUTED LOCK MANAGER
 * CLASIFICACIÓN: CORE RELIABILITY (ESTRATO L1)
 * RESPONSABILIDAD: EXCLUSIÓN MUTUA ATÓMICA, ACOTADA POR TTL
 *
 * This is the only serialization point for per-tenant ingestion runs.
 * The manager itself holds no state — it delegates the atomic
 * find-and-modify to a `LockStore` implementation (the Store layer) and
 * adds nothing but logging and TTL defaulting on top. A lost race
 * produces a clean `false`, never a duplicate lock.
 * =================================================================
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use ticketflow_domain_models::LockRecord;
use tracing::{debug, instrument, warn};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Backing persistence contract the Store layer implements. Kept as a
/// trait so `ticketflow-core-lock-manager` never depends on a concrete
/// database driver.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Atomically claims `resource_id` for `owner_id` iff it is absent or
    /// expired. Returns `Ok(true)` on success, `Ok(false)` on conflict.
    async fn try_acquire(
        &self,
        resource_id: &str,
        owner_id: &str,
        acquired_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, LockError>;

    /// Atomically bumps `expires_at` iff `owner_id` still matches.
    async fn try_refresh(
        &self,
        resource_id: &str,
        owner_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, LockError>;

    /// Deletes the lock iff `owner_id` matches. Idempotent.
    async fn release(&self, resource_id: &str, owner_id: &str) -> Result<(), LockError>;

    async fn inspect(&self, resource_id: &str) -> Result<Option<LockRecord>, LockError>;
}

const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Non-blocking, O(1)-per-call mutual exclusion keyed by resource name.
/// Carries no per-resource state of its own; every call round-trips to
/// the backing `LockStore`.
#[derive(Clone)]
pub struct LockManager {
    store: Arc<dyn LockStore>,
    default_ttl: Duration,
}

impl LockManager {
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self {
            store,
            default_ttl: DEFAULT_TTL,
        }
    }

    pub fn with_default_ttl(store: Arc<dyn LockStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    /// Attempts to acquire `resource_id` for `owner_id`. Callers must
    /// treat `Ok(false)` as conflict, not as an error.
    #[instrument(skip(self))]
    pub async fn acquire(&self, resource_id: &str, owner_id: &str) -> Result<bool, LockError> {
        self.acquire_with_ttl(resource_id, owner_id, self.default_ttl).await
    }

    #[instrument(skip(self))]
    pub async fn acquire_with_ttl(
        &self,
        resource_id: &str,
        owner_id: &str,
        ttl: Duration,
    ) -> Result<bool, LockError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(60));

        let acquired = self.store.try_acquire(resource_id, owner_id, now, expires_at).await?;

        if acquired {
            debug!(resource_id, owner_id, "lock acquired");
        } else {
            debug!(resource_id, owner_id, "lock acquisition lost the race");
        }

        Ok(acquired)
    }

    /// Refreshes the lease. `Ok(false)` means the caller is no longer the
    /// owner and must abandon its work immediately.
    #[instrument(skip(self))]
    pub async fn refresh(&self, resource_id: &str, owner_id: &str) -> Result<bool, LockError> {
        self.refresh_with_ttl(resource_id, owner_id, self.default_ttl).await
    }

    #[instrument(skip(self))]
    pub async fn refresh_with_ttl(
        &self,
        resource_id: &str,
        owner_id: &str,
        ttl: Duration,
    ) -> Result<bool, LockError> {
        let expires_at = Utc::now() + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(60));
        let refreshed = self.store.try_refresh(resource_id, owner_id, expires_at).await?;

        if !refreshed {
            warn!(resource_id, owner_id, "lease refresh rejected: no longer the owner");
        }

        Ok(refreshed)
    }

    #[instrument(skip(self))]
    pub async fn release(&self, resource_id: &str, owner_id: &str) -> Result<(), LockError> {
        self.store.release(resource_id, owner_id).await?;
        debug!(resource_id, owner_id, "lock released");
        Ok(())
    }

    pub async fn inspect(&self, resource_id: &str) -> Result<Option<LockRecord>, LockError> {
        self.store.inspect(resource_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    struct InMemoryLockStore {
        rows: StdMutex<std::collections::HashMap<String, LockRecord>>,
    }

    impl InMemoryLockStore {
        fn new() -> Self {
            Self {
                rows: StdMutex::new(std::collections::HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl LockStore for InMemoryLockStore {
        async fn try_acquire(
            &self,
            resource_id: &str,
            owner_id: &str,
            acquired_at: DateTime<Utc>,
            expires_at: DateTime<Utc>,
        ) -> Result<bool, LockError> {
            let mut rows = self.rows.lock().unwrap();
            let free = match rows.get(resource_id) {
                None => true,
                Some(existing) => existing.is_expired(Utc::now()),
            };
            if free {
                rows.insert(
                    resource_id.to_string(),
                    LockRecord {
                        resource_id: resource_id.to_string(),
                        owner_id: owner_id.to_string(),
                        acquired_at,
                        expires_at,
                    },
                );
            }
            Ok(free)
        }

        async fn try_refresh(
            &self,
            resource_id: &str,
            owner_id: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<bool, LockError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(resource_id) {
                Some(row) if row.owner_id == owner_id => {
                    row.expires_at = expires_at;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn release(&self, resource_id: &str, owner_id: &str) -> Result<(), LockError> {
            let mut rows = self.rows.lock().unwrap();
            if let Some(existing) = rows.get(resource_id) {
                if existing.owner_id == owner_id {
                    rows.remove(resource_id);
                }
            }
            Ok(())
        }

        async fn inspect(&self, resource_id: &str) -> Result<Option<LockRecord>, LockError> {
            Ok(self.rows.lock().unwrap().get(resource_id).cloned())
        }
    }

    #[tokio::test]
    async fn second_acquire_without_release_fails() {
        let manager = LockManager::new(Arc::new(InMemoryLockStore::new()));
        assert!(manager.acquire("ingest:t1", "job-a").await.unwrap());
        assert!(!manager.acquire("ingest:t1", "job-b").await.unwrap());
    }

    #[tokio::test]
    async fn release_then_acquire_by_another_owner_succeeds() {
        let manager = LockManager::new(Arc::new(InMemoryLockStore::new()));
        assert!(manager.acquire("ingest:t1", "job-a").await.unwrap());
        manager.release("ingest:t1", "job-a").await.unwrap();
        assert!(manager.acquire("ingest:t1", "job-b").await.unwrap());
    }

    #[tokio::test]
    async fn refresh_by_non_owner_is_rejected() {
        let manager = LockManager::new(Arc::new(InMemoryLockStore::new()));
        manager.acquire("ingest:t1", "job-a").await.unwrap();
        assert!(!manager.refresh("ingest:t1", "job-b").await.unwrap());
        assert!(manager.refresh("ingest:t1", "job-a").await.unwrap());
    }

    #[tokio::test]
    async fn release_by_non_owner_is_a_no_op() {
        let manager = LockManager::new(Arc::new(InMemoryLockStore::new()));
        manager.acquire("ingest:t1", "job-a").await.unwrap();
        manager.release("ingest:t1", "job-b").await.unwrap();
        // still held by job-a
        assert!(!manager.acquire("ingest:t1", "job-c").await.unwrap());
    }
}
