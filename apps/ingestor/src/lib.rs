// [apps/ingestor/src/lib.rs]
/*!
 * Crate root: the ticket ingestion and analytics HTTP service.
 */

pub mod config;
pub mod errors;
pub mod handlers;
pub mod kernel;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub mod prelude {
    pub use crate::config::IngestorConfig;
    pub use crate::kernel::IngestorKernel;
    pub use crate::state::AppState;
}
