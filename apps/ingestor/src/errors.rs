// [apps/ingestor/src/errors.rs]
/*!
 * Boundary error type. Every handler returns `Result<_, ApiError>`; this
 * is the only place that maps the domain error taxonomy onto HTTP
 * status codes and the only place that logs an error (no silent drops,
 * no double logging upstream of here).
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use ticketflow_core_lock_manager::LockError;
use ticketflow_infra_db::DbError;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("lock conflict")]
    LockConflict,

    #[error("not found")]
    NotFound,

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for ApiError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::TicketNotFound | DbError::JobNotFound => ApiError::NotFound,
            DbError::InvalidJobState => ApiError::BadRequest("job is not in a state that allows this action".into()),
            DbError::ConnectionError(message) | DbError::ConfigurationError(message) => {
                ApiError::DependencyUnavailable(message)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<LockError> for ApiError {
    fn from(error: LockError) -> Self {
        match error {
            LockError::StoreUnavailable(message) => ApiError::DependencyUnavailable(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::LockConflict => (StatusCode::CONFLICT, self.to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::DependencyUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::SERVICE_UNAVAILABLE {
            error!(status = status.as_u16(), error = %self, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
