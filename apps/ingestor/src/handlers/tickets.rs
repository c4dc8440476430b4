// [apps/ingestor/src/handlers/tickets.rs]
/*!
 * Read-only ticket endpoints. Every query is tenant-scoped and excludes
 * soft-deleted rows — repositories already enforce this at the SQL
 * level, this layer only adds pagination defaults and the single
 * "does this external id belong to this tenant" 404 check.
 */

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use ticketflow_domain_models::Ticket;

use crate::errors::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tenant_id: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Result<Json<Vec<Ticket>>, ApiError> {
    let tickets = state
        .ticket_repository
        .list_by_tenant(&query.tenant_id, query.limit.unwrap_or(DEFAULT_LIMIT), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(tickets))
}

pub async fn urgent(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Result<Json<Vec<Ticket>>, ApiError> {
    let tickets = state
        .ticket_repository
        .list_urgent(&query.tenant_id, query.limit.unwrap_or(DEFAULT_LIMIT), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(tickets))
}

#[derive(Debug, Deserialize)]
pub struct TenantOnlyQuery {
    pub tenant_id: String,
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    Query(query): Query<TenantOnlyQuery>,
) -> Result<Json<Ticket>, ApiError> {
    let (_, ticket) = state
        .ticket_repository
        .find_by_external_id(&query.tenant_id, &external_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if ticket.deleted_at.is_some() {
        return Err(ApiError::NotFound);
    }

    Ok(Json(ticket))
}

pub async fn history(
    State(state): State<AppState>,
    Path(external_id): Path<String>,
    Query(query): Query<TenantOnlyQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (ticket_id, _) = state
        .ticket_repository
        .find_by_external_id(&query.tenant_id, &external_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let entries = state.history_repository.list_by_ticket(&query.tenant_id, &ticket_id).await?;
    Ok(Json(serde_json::json!(entries)))
}
