// [apps/ingestor/src/handlers/ingest.rs]
/*!
 * Ingestion lifecycle endpoints: trigger a run, inspect its progress,
 * cancel it, and inspect the per-tenant lock.
 */

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::services::IngestOrchestrator;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TenantQuery {
    pub tenant_id: String,
}

pub async fn run(State(state): State<AppState>, Query(query): Query<TenantQuery>) -> Result<Json<serde_json::Value>, ApiError> {
    let orchestrator = IngestOrchestrator::new(state);
    let summary = orchestrator.run(&query.tenant_id).await?;
    Ok(Json(serde_json::json!(summary)))
}

#[derive(Debug, Serialize)]
pub struct IngestStatus {
    pub running: bool,
    pub job_id: Option<String>,
}

pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<TenantQuery>,
) -> Result<Json<IngestStatus>, ApiError> {
    let resource_id = format!("ingest:{}", query.tenant_id);
    let lock = state.lock_manager.inspect(&resource_id).await?;

    let running = lock.as_ref().map(|record| !record.is_expired(chrono::Utc::now())).unwrap_or(false);
    let job_id = if running { lock.map(|record| record.owner_id) } else { None };

    Ok(Json(IngestStatus { running, job_id }))
}

pub async fn progress(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let job = state.job_repository.find_by_id(&job_id).await?.ok_or(ApiError::NotFound)?;

    Ok(Json(serde_json::json!({
        "job_id": job.job_id,
        "status": job.status.as_str(),
        "progress": job.progress,
        "total_pages": job.total_pages,
        "processed_pages": job.processed_pages,
    })))
}

pub async fn cancel(State(state): State<AppState>, Path(job_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.request_cancellation(&job_id).await {
        return Err(ApiError::NotFound);
    }

    Ok(Json(serde_json::json!({ "status": "cancelled", "job_id": job_id })))
}

pub async fn lock_status(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let resource_id = format!("ingest:{tenant_id}");
    let lock = state.lock_manager.inspect(&resource_id).await?;
    Ok(Json(serde_json::json!(lock)))
}
