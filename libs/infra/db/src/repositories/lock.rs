// [libs/infra/db/src/repositories/lock.rs]
/*!
 * `LockStore` implementation backed by `distributed_locks`. Every
 * operation is a single UPSERT/UPDATE/DELETE statement — SQLite executes
 * each statement atomically, so no explicit transaction wrapper is
 * needed to avoid a lost-update race between two ingestion runs racing
 * for the same tenant.
 */

use crate::errors::DbError;
use crate::DatabaseClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::params;
use ticketflow_core_lock_manager::{LockError, LockStore};
use ticketflow_domain_models::LockRecord;
use tracing::instrument;

pub struct LockRepository {
    database_client: DatabaseClient,
}

impl LockRepository {
    pub fn new(database_client: DatabaseClient) -> Self {
        Self { database_client }
    }
}

fn to_rfc3339(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(format!("invalid timestamp '{raw}': {e}")))
}

#[async_trait]
impl LockStore for LockRepository {
    #[instrument(skip(self))]
    async fn try_acquire(
        &self,
        resource_id: &str,
        owner_id: &str,
        acquired_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, LockError> {
        let connection = self
            .database_client
            .get_connection()
            .map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        let sql = r#"
            INSERT INTO distributed_locks (resource_id, owner_id, acquired_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(resource_id) DO UPDATE SET
                owner_id = excluded.owner_id,
                acquired_at = excluded.acquired_at,
                expires_at = excluded.expires_at
            WHERE distributed_locks.expires_at < ?3
        "#;

        let changed = connection
            .execute(
                sql,
                params![resource_id, owner_id, to_rfc3339(acquired_at), to_rfc3339(expires_at)],
            )
            .await
            .map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        Ok(changed > 0)
    }

    #[instrument(skip(self))]
    async fn try_refresh(
        &self,
        resource_id: &str,
        owner_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, LockError> {
        let connection = self
            .database_client
            .get_connection()
            .map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        let sql = "UPDATE distributed_locks SET expires_at = ?1 WHERE resource_id = ?2 AND owner_id = ?3";
        let changed = connection
            .execute(sql, params![to_rfc3339(expires_at), resource_id, owner_id])
            .await
            .map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        Ok(changed > 0)
    }

    #[instrument(skip(self))]
    async fn release(&self, resource_id: &str, owner_id: &str) -> Result<(), LockError> {
        let connection = self
            .database_client
            .get_connection()
            .map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        connection
            .execute(
                "DELETE FROM distributed_locks WHERE resource_id = ?1 AND owner_id = ?2",
                params![resource_id, owner_id],
            )
            .await
            .map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn inspect(&self, resource_id: &str) -> Result<Option<LockRecord>, LockError> {
        let connection = self
            .database_client
            .get_connection()
            .map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        let mut rows = connection
            .query(
                "SELECT resource_id, owner_id, acquired_at, expires_at FROM distributed_locks WHERE resource_id = ?1",
                params![resource_id],
            )
            .await
            .map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        let Some(row) = rows.next().await.map_err(|e| LockError::StoreUnavailable(e.to_string()))? else {
            return Ok(None);
        };

        let resource_id: String = row.get(0).map_err(|e| LockError::StoreUnavailable(e.to_string()))?;
        let owner_id: String = row.get(1).map_err(|e| LockError::StoreUnavailable(e.to_string()))?;
        let acquired_at: String = row.get(2).map_err(|e| LockError::StoreUnavailable(e.to_string()))?;
        let expires_at: String = row.get(3).map_err(|e| LockError::StoreUnavailable(e.to_string()))?;

        Ok(Some(LockRecord {
            resource_id,
            owner_id,
            acquired_at: parse_timestamp(&acquired_at).map_err(|e| LockError::StoreUnavailable(e.to_string()))?,
            expires_at: parse_timestamp(&expires_at).map_err(|e| LockError::StoreUnavailable(e.to_string()))?,
        }))
    }
}
