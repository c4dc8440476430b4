// [libs/infra/source-client/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SOURCE CLIENT LIBRARY BARREL
 * CLASIFICACIÓN: INFRASTRUCTURE LIB (ESTRATO L3)
 * =================================================================
 */

pub mod client;
pub mod errors;

pub use client::{SourceClient, SourcePage};
pub use errors::ClientError;
