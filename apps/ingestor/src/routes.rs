// [apps/ingestor/src/routes.rs]
/*!
 * Router wiring: one route per entry in the HTTP surface table, CORS
 * open to any origin (dashboards are read-only consumers, there are no
 * cookies to protect), request tracing applied globally.
 */

use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, ingest, ops, stats, tickets};
use crate::middleware::request_id;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let ingest_routes = Router::new()
        .route("/run", post(ingest::run))
        .route("/status", get(ingest::status))
        .route("/progress/:job_id", get(ingest::progress))
        .route("/:job_id", delete(ingest::cancel))
        .route("/lock/:tenant_id", get(ingest::lock_status));

    let ticket_routes = Router::new()
        .route("/", get(tickets::list))
        .route("/urgent", get(tickets::urgent))
        .route("/:external_id", get(tickets::get_one))
        .route("/:external_id/history", get(tickets::history));

    let ops_routes = Router::new()
        .route("/circuit/:name/status", get(ops::circuit_status))
        .route("/circuit/:name/reset", post(ops::circuit_reset))
        .route("/rate-limiter/status", get(ops::rate_limiter_status));

    Router::new()
        .route("/health", get(health::health))
        .nest("/ingest", ingest_routes)
        .nest("/tickets", ticket_routes)
        .route("/tenants/:tenant_id/stats", get(stats::dashboard))
        .merge(ops_routes)
        .layer(middleware::from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
