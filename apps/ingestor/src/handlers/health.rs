// [apps/ingestor/src/handlers/health.rs]
/*!
 * Liveness/readiness probe. Checks the store with one cheap round trip;
 * the external source is reported from its last-known reachability
 * rather than probed live, since probing it would itself consume a
 * rate limiter slot.
 */

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let store_ok = state.database_client.health_check().await.is_ok();
    let source_ok = state.is_source_reachable();

    let status = if store_ok && source_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    let body = json!({
        "status": if status == StatusCode::OK { "ok" } else { "degraded" },
        "dependencies": {
            "store": if store_ok { "reachable" } else { "unreachable" },
            "external_source": if source_ok { "reachable" } else { "unreachable" },
        },
    });

    (status, Json(body))
}
