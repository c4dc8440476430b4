// [apps/ingestor/src/handlers/stats.rs]
/*!
 * Dashboard analytics endpoint. `from_date`/`to_date` are accepted for
 * forward compatibility with a windowed query but are not yet applied —
 * `AnalyticsRepository` computes over the whole tenant history; see
 * DESIGN.md for the reasoning.
 */

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use ticketflow_domain_models::DashboardStats;

use crate::errors::ApiError;
use crate::services::AnalyticsService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    Query(_query): Query<StatsQuery>,
) -> Result<Json<DashboardStats>, ApiError> {
    let analytics = AnalyticsService::new(state.analytics_repository.clone());
    let stats = analytics.dashboard(&tenant_id).await?;
    Ok(Json(stats))
}
