// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODEL CATALOG
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS SOBERANOS DEL DOMINIO DE TICKETS
 *
 * Single source of truth for the entities that travel between the
 * Store, the ingestion services, and the HTTP boundary. Nothing above
 * `ticketflow-infra-db` should construct these from a raw row or a
 * raw JSON value — repositories own that translation.
 * =================================================================
 */

pub mod ticket;
pub mod job;
pub mod lock;
pub mod history;
pub mod analytics;

pub use analytics::{DashboardStats, HourlyBucket, KeywordCount, RiskyCustomer, StatusCount};
pub use history::{HistoryAction, TicketHistoryEntry};
pub use job::{IngestionJob, IngestionLog, JobStatus};
pub use lock::LockRecord;
pub use ticket::{Sentiment, Ticket, Urgency};
