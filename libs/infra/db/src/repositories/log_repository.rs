// [libs/infra/db/src/repositories/log_repository.rs]
/*!
 * IngestionLog is append-only: exactly one row per run that acquired
 * the tenant lock, written unconditionally on the way out of
 * IngestOrchestrator regardless of success or failure.
 */

use crate::errors::DbError;
use crate::DatabaseClient;
use libsql::params;
use ticketflow_domain_models::IngestionLog;
use tracing::instrument;

pub struct LogRepository {
    database_client: DatabaseClient,
}

impl LogRepository {
    pub fn new(database_client: DatabaseClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self, log))]
    pub async fn insert(&self, log: &IngestionLog) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "INSERT INTO ingestion_logs (log_id, tenant_id, job_id, started_at, ended_at,
                    new_ingested, updated, errors, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    log.log_id.clone(),
                    log.tenant_id.clone(),
                    log.job_id.clone(),
                    log.started_at.to_rfc3339(),
                    log.ended_at.to_rfc3339(),
                    log.new_ingested,
                    log.updated,
                    log.errors,
                    log.error.clone(),
                ],
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_by_tenant(&self, tenant_id: &str, limit: i64) -> Result<Vec<IngestionLog>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT log_id, tenant_id, job_id, started_at, ended_at, new_ingested, updated, errors, error
                 FROM ingestion_logs WHERE tenant_id = ?1 ORDER BY started_at DESC LIMIT ?2",
                params![tenant_id, limit],
            )
            .await?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().await? {
            result.push(IngestionLog {
                log_id: row.get(0)?,
                tenant_id: row.get(1)?,
                job_id: row.get(2)?,
                started_at: parse_timestamp(&row.get::<String>(3)?)?,
                ended_at: parse_timestamp(&row.get::<String>(4)?)?,
                new_ingested: row.get(5)?,
                updated: row.get(6)?,
                errors: row.get(7)?,
                error: row.get(8)?,
            });
        }
        Ok(result)
    }
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, DbError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&chrono::Utc))
        .map_err(|e| DbError::MappingError(format!("invalid timestamp '{raw}': {e}")))
}
