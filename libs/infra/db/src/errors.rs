// [libs/infra/db/src/errors.rs]
/*!
 * Error catalog for the persistence adapter. `QueryError` wraps the
 * driver's own error type; everything else names a domain-level failure
 * so callers upstream can match on it instead of parsing strings.
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    ConnectionError(String),

    #[error("database configuration invalid: {0}")]
    ConfigurationError(String),

    #[error("query rejected: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("row mapping failed: {0}")]
    MappingError(String),

    #[error("ticket not found")]
    TicketNotFound,

    #[error("job not found")]
    JobNotFound,

    #[error("job is not in a state that allows this transition")]
    InvalidJobState,

    #[error("transaction failed: {0}")]
    TransactionError(String),
}
