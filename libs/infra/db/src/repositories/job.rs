// [libs/infra/db/src/repositories/job.rs]
/*!
 * IngestionJob lifecycle. Mutual exclusion across tenants is the
 * LockManager's job, not this repository's — every method here assumes
 * the caller already holds the per-tenant lock.
 */

use crate::errors::DbError;
use crate::DatabaseClient;
use chrono::{DateTime, Utc};
use libsql::params;
use std::str::FromStr;
use ticketflow_domain_models::{IngestionJob, JobStatus};
use tracing::instrument;

pub struct JobRepository {
    database_client: DatabaseClient,
}

impl JobRepository {
    pub fn new(database_client: DatabaseClient) -> Self {
        Self { database_client }
    }

    /// `job_id` is supplied by the caller (the orchestrator generates it
    /// before attempting lock acquisition, then reuses it here) rather
    /// than generated inside this method, so the same id identifies both
    /// the lock owner and the job row.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        job_id: &str,
        tenant_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<IngestionJob, DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "INSERT INTO ingestion_jobs (job_id, tenant_id, status, started_at, ended_at,
                    total_pages, processed_pages, progress)
                 VALUES (?1, ?2, ?3, ?4, NULL, 0, 0, 0)",
                params![job_id, tenant_id, JobStatus::Running.as_str(), started_at.to_rfc3339()],
            )
            .await?;

        Ok(IngestionJob {
            job_id: job_id.to_string(),
            tenant_id: tenant_id.to_string(),
            status: JobStatus::Running,
            started_at,
            ended_at: None,
            total_pages: 0,
            processed_pages: 0,
            progress: 0,
        })
    }

    #[instrument(skip(self))]
    pub async fn update_progress(
        &self,
        job_id: &str,
        total_pages: i64,
        processed_pages: i64,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let progress = IngestionJob::compute_progress(processed_pages, total_pages, false);

        let changed = connection
            .execute(
                "UPDATE ingestion_jobs SET total_pages = ?1, processed_pages = ?2, progress = ?3
                 WHERE job_id = ?4 AND status = 'running'",
                params![total_pages, processed_pages, progress, job_id],
            )
            .await?;

        if changed == 0 {
            return Err(DbError::InvalidJobState);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn finish(
        &self,
        job_id: &str,
        status: JobStatus,
        ended_at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        connection
            .execute(
                "UPDATE ingestion_jobs SET status = ?1, ended_at = ?2, progress = 100
                 WHERE job_id = ?3",
                params![status.as_str(), ended_at.to_rfc3339(), job_id],
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, job_id: &str) -> Result<Option<IngestionJob>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT job_id, tenant_id, status, started_at, ended_at, total_pages, processed_pages, progress
                 FROM ingestion_jobs WHERE job_id = ?1",
                params![job_id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        Ok(Some(row_to_job(&row)?))
    }
}

fn row_to_job(row: &libsql::Row) -> Result<IngestionJob, DbError> {
    let ended_at_raw: Option<String> = row.get(4)?;

    Ok(IngestionJob {
        job_id: row.get(0)?,
        tenant_id: row.get(1)?,
        status: JobStatus::from_str(&row.get::<String>(2)?).map_err(DbError::MappingError)?,
        started_at: parse_timestamp(&row.get::<String>(3)?)?,
        ended_at: ended_at_raw.map(|raw| parse_timestamp(&raw)).transpose()?,
        total_pages: row.get(5)?,
        processed_pages: row.get(6)?,
        progress: row.get(7)?,
    })
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(format!("invalid timestamp '{raw}': {e}")))
}
