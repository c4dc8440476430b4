// [libs/domain/models/src/lock.rs]
/*!
 * Distributed lock row. Owned exclusively by `ticketflow-core-lock-manager`
 * and the `LockRepository` — nothing else should construct one by hand.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub resource_id: String,
    pub owner_id: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LockRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
