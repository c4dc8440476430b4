// [apps/ingestor/src/handlers/mod.rs]
/*!
 * HTTP adapters. Each module is one resource area from the routing
 * table; none of them hold state beyond what `AppState` already owns.
 */

pub mod health;
pub mod ingest;
pub mod ops;
pub mod stats;
pub mod tickets;
