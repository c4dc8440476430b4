// [libs/infra/source-client/src/errors.rs]
/*!
 * Error catalog for the external ticket source adapter.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("network error: {0}")]
    NetworkFault(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    DecodingFault(#[from] serde_json::Error),

    #[error("source rejected the request: HTTP {0}")]
    ServerRejection(u16),

    #[error("source rate-limited the request")]
    RateLimited,

    #[error("source retries exhausted after {0} attempts")]
    RetriesExhausted(u32),
}
