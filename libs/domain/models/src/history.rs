// [libs/domain/models/src/history.rs]
/*!
 * Append-only ticket change log, written by SyncEngine on every
 * state-changing operation (create, field update, soft delete).
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
}

impl HistoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryAction::Created => "created",
            HistoryAction::Updated => "updated",
            HistoryAction::Deleted => "deleted",
        }
    }
}

/// Before/after pair for one changed field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Option<String>,
    pub new: Option<String>,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketHistoryEntry {
    pub history_id: String,
    pub ticket_id: String,
    pub tenant_id: String,
    pub action: HistoryAction,
    /// Field name -> {old, new}. Empty for `created`/`deleted` entries.
    pub changes: BTreeMap<String, FieldChange>,
    pub recorded_at: DateTime<Utc>,
}
