// [apps/ingestor/src/services/orchestrator.rs]
/*!
 * One ingestion run's state machine, keyed by `job_id`:
 *
 * ```
 * INIT -> (try lock) -> LOCK_HELD -> FETCHING <-> PROCESSING -> (deletion sweep) -> DONE
 *    |        |                                                                       |
 *    |        +-> CANCEL_REQUESTED -> CANCELLING -> DONE(cancelled)                   |
 *    +-> DONE(conflict:409)                                                           |
 *                                                                                    |
 *  any transient failure -> FAILED (audit written)                                   |
 * ```
 *
 * The lock is the only serialization point: there is no pre-check of
 * existing jobs before `LockManager.acquire`. A lease refresher keeps
 * the lock alive for the run's duration and self-aborts the run (via the
 * shared cancellation flag) the moment it is no longer the owner — it
 * never touches the job row itself, preserving single-writer discipline.
 */

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use ticketflow_domain_models::{IngestionLog, JobStatus};
use ticketflow_domain_notification::NotificationPayload;

use crate::errors::ApiError;
use crate::services::sync_engine::{SyncEngine, SyncOutcome};
use crate::state::AppState;

const PAGE_SIZE: u32 = 50;
const LEASE_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
pub struct IngestRunSummary {
    pub job_id: String,
    pub status: String,
    pub new_ingested: i64,
    pub updated: i64,
    pub errors: i64,
}

pub struct IngestOrchestrator {
    state: AppState,
}

impl IngestOrchestrator {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    #[instrument(skip(self))]
    pub async fn run(&self, tenant_id: &str) -> Result<IngestRunSummary, ApiError> {
        let job_id = Uuid::new_v4().to_string();
        let resource_id = format!("ingest:{tenant_id}");
        let started_at = Utc::now();

        let acquired = self
            .state
            .lock_manager
            .acquire_with_ttl(&resource_id, &job_id, self.state.lock_ttl)
            .await?;

        if !acquired {
            return Err(ApiError::LockConflict);
        }

        let outcome = match self.state.job_repository.create(&job_id, tenant_id, started_at).await {
            Ok(_) => {
                let cancel_flag = self.state.register_cancellation(&job_id).await;
                let lease_handle = self.spawn_lease_refresher(resource_id.clone(), job_id.clone(), cancel_flag.clone());

                let fetch_outcome = self.drive_fetch_loop(tenant_id, &job_id, &cancel_flag).await;
                lease_handle.abort();
                fetch_outcome
            }
            Err(error) => Err(format!("failed to create job row: {error}")),
        };

        let (status, new_ingested, updated, errors, failure) = match outcome {
            Ok(progress) if progress.cancelled => {
                (JobStatus::Cancelled, progress.new_ingested, progress.updated, progress.errors, None)
            }
            Ok(progress) => {
                (JobStatus::Completed, progress.new_ingested, progress.updated, progress.errors, None)
            }
            Err(message) => (JobStatus::Failed, 0, 0, 0, Some(message)),
        };

        let ended_at = Utc::now();
        self.state.job_repository.finish(&job_id, status, ended_at).await?;
        if let Err(error) = self.state.lock_manager.release(&resource_id, &job_id).await {
            warn!(job_id = %job_id, %error, "failed to release ingestion lock during teardown");
        }
        self.state.clear_cancellation(&job_id).await;

        self.state
            .log_repository
            .insert(&IngestionLog {
                log_id: Uuid::new_v4().to_string(),
                tenant_id: tenant_id.to_string(),
                job_id: job_id.clone(),
                started_at,
                ended_at,
                new_ingested,
                updated,
                errors,
                error: failure,
            })
            .await?;

        info!(job_id = %job_id, status = status.as_str(), new_ingested, updated, errors, "ingestion run finished");

        Ok(IngestRunSummary {
            job_id,
            status: status.as_str().to_string(),
            new_ingested,
            updated,
            errors,
        })
    }

    fn spawn_lease_refresher(
        &self,
        resource_id: String,
        owner_id: String,
        cancel_flag: Arc<AtomicBool>,
    ) -> tokio::task::JoinHandle<()> {
        let lock_manager = self.state.lock_manager.clone();
        let ttl = self.state.lock_ttl;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(LEASE_REFRESH_INTERVAL);
            ticker.tick().await; // consume the immediate first tick
            loop {
                ticker.tick().await;
                match lock_manager.refresh_with_ttl(&resource_id, &owner_id, ttl).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(resource_id, owner_id, "lease refresh lost ownership, self-aborting run");
                        cancel_flag.store(true, Ordering::SeqCst);
                        break;
                    }
                    Err(error) => {
                        warn!(resource_id, owner_id, %error, "lease refresh failed, self-aborting run");
                        cancel_flag.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            }
        })
    }

    async fn drive_fetch_loop(
        &self,
        tenant_id: &str,
        job_id: &str,
        cancel_flag: &Arc<AtomicBool>,
    ) -> Result<FetchProgress, String> {
        let sync_engine = SyncEngine::new(self.state.ticket_repository.clone(), self.state.history_repository.clone());

        let mut page = 1u32;
        let mut processed_pages = 0i64;
        let mut total_pages = 1i64;
        let mut new_ingested = 0i64;
        let mut updated = 0i64;
        let mut errors = 0i64;
        let mut seen_external_ids = HashSet::new();

        loop {
            if cancel_flag.load(Ordering::SeqCst) {
                return Ok(FetchProgress { new_ingested, updated, errors, cancelled: true });
            }

            self.state.rate_limiter.acquire().await;

            let source_page = match self.state.source_client.fetch_page(tenant_id, page, PAGE_SIZE).await {
                Ok(source_page) => {
                    self.state.mark_source_reachable(true);
                    source_page
                }
                Err(error) => {
                    self.state.mark_source_reachable(false);
                    return Err(error.to_string());
                }
            };

            total_pages = source_page.total_pages as i64;

            for external in &source_page.tickets {
                seen_external_ids.insert(external.external_id.clone());

                match sync_engine.sync(tenant_id, external, Utc::now()).await {
                    Ok(result) => {
                        match result.outcome {
                            SyncOutcome::Created => new_ingested += 1,
                            SyncOutcome::Updated => updated += 1,
                            SyncOutcome::Unchanged => {}
                        }
                        if result.warrants_notification() {
                            self.schedule_notification(tenant_id, &result.ticket_id, &result.subject).await;
                        }
                    }
                    Err(error) => {
                        errors += 1;
                        warn!(job_id, external_id = %external.external_id, %error, "failed to sync ticket, skipping");
                    }
                }
            }

            processed_pages += 1;
            self.state
                .job_repository
                .update_progress(job_id, total_pages, processed_pages)
                .await
                .map_err(|error| error.to_string())?;

            if !source_page.has_more() {
                break;
            }

            if cancel_flag.load(Ordering::SeqCst) {
                return Ok(FetchProgress { new_ingested, updated, errors, cancelled: true });
            }

            page += 1;
        }

        sync_engine
            .sweep_deleted(tenant_id, &seen_external_ids, Utc::now())
            .await
            .map_err(|error| error.to_string())?;

        Ok(FetchProgress { new_ingested, updated, errors, cancelled: false })
    }

    async fn schedule_notification(&self, tenant_id: &str, ticket_id: &str, subject: &str) {
        let payload = NotificationPayload::for_high_urgency_ticket(tenant_id, ticket_id, subject);
        if self.state.notifier_tx.try_send(payload).is_err() {
            warn!(tenant_id, ticket_id, "notifier channel full, dropping notification task");
        }
    }
}

struct FetchProgress {
    new_ingested: i64,
    updated: i64,
    errors: i64,
    cancelled: bool,
}
