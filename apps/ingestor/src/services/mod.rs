// [apps/ingestor/src/services/mod.rs]
/*!
 * Application services: the ticket-ingestion reliability fabric that
 * sits on top of the workspace's core/domain/infra crates.
 */

pub mod analytics;
pub mod notifier;
pub mod orchestrator;
pub mod sync_engine;

pub use analytics::AnalyticsService;
pub use notifier::{spawn_notifier_pool, NotifierClient};
pub use orchestrator::{IngestOrchestrator, IngestRunSummary};
pub use sync_engine::SyncEngine;
