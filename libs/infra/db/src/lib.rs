// [libs/infra/db/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PERSISTENCE ADAPTER
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: IMPLEMENTACIÓN LIBSQL DE LOS PUERTOS DEL DOMINIO
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::DatabaseClient;
pub use errors::DbError;
pub use repositories::{
    AnalyticsRepository, HistoryRepository, JobRepository, LockRepository, LogRepository, TicketRepository,
};
