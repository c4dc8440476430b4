// [apps/ingestor/src/handlers/ops.rs]
/*!
 * Operator-facing introspection for the reliability fabric: circuit
 * breaker state and rate limiter headroom. Not tenant-scoped — these
 * describe the process, not a tenant's data.
 */

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn circuit_status(State(state): State<AppState>, Path(name): Path<String>) -> Json<serde_json::Value> {
    let breaker = state.circuit_breakers.get_or_create(&name);
    let (failure_count, window_size) = breaker.outcome_window();

    Json(json!({
        "name": breaker.name(),
        "state": breaker.state().as_str(),
        "failure_count": failure_count,
        "window_size": window_size,
    }))
}

pub async fn circuit_reset(State(state): State<AppState>, Path(name): Path<String>) -> Json<serde_json::Value> {
    let breaker = state.circuit_breakers.get_or_create(&name);
    breaker.reset();
    Json(json!({ "name": breaker.name(), "state": breaker.state().as_str() }))
}

pub async fn rate_limiter_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let in_flight = state.rate_limiter.in_flight().await;

    Json(json!({
        "capacity": state.rate_limiter.capacity(),
        "window_secs": state.rate_limiter.window().as_secs(),
        "in_flight": in_flight,
    }))
}
