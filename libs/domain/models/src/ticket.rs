// [libs/domain/models/src/ticket.rs]
/*!
 * Ticket entity and the classifier's output vocabulary.
 *
 * `(tenant_id, external_id)` is the natural key enforced by the Store's
 * unique index; this struct carries both, it never assumes the caller
 * already knows the tenant.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Urgency bucket produced by the classifier.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => Err(format!("unrecognized urgency '{other}'")),
        }
    }
}

/// Sentiment bucket produced by the classifier.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" => Ok(Sentiment::Positive),
            other => Err(format!("unrecognized sentiment '{other}'")),
        }
    }
}

/// One support ticket, as persisted. Soft-deleted rows are excluded by
/// every repository read path, never by callers filtering after the fact.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub tenant_id: String,
    pub external_id: String,
    pub customer_id: String,
    pub source: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub urgency: Urgency,
    pub sentiment: Sentiment,
    pub requires_action: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// The subset of fields the external source supplies per ticket, before
/// classification. Distinct from `Ticket` because the classifier outputs
/// (urgency/sentiment/requires_action) don't exist until sync time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalTicket {
    pub external_id: String,
    pub customer_id: String,
    pub source: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// The fields SyncEngine compares to decide between `created`, `updated`
/// and `unchanged`. Mirrors spec §4.7's explicit diff field set.
pub const DIFFABLE_FIELDS: &[&str] = &[
    "subject",
    "message",
    "status",
    "urgency",
    "sentiment",
    "requires_action",
    "customer_id",
    "source",
];
