// [libs/domain/models/src/analytics.rs]
/*!
 * Dashboard payload shape — the combined result of Analytics' per-facet
 * queries. Plain data; no aggregation logic lives here.
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyBucket {
    /// RFC 3339 hour boundary, e.g. "2026-07-26T14:00:00Z".
    pub hour: String,
    pub count: i64,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: i64,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskyCustomer {
    pub customer_id: String,
    pub high_urgency_count: i64,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_tickets: i64,
    pub by_status: Vec<StatusCount>,
    pub urgency_high_ratio: f64,
    pub negative_sentiment_ratio: f64,
    pub hourly_trend: Vec<HourlyBucket>,
    pub top_keywords: Vec<KeywordCount>,
    pub at_risk_customers: Vec<RiskyCustomer>,
}

impl DashboardStats {
    /// Spec §4.9: empty result sets return zeros, not errors.
    pub fn empty() -> Self {
        Self {
            total_tickets: 0,
            by_status: Vec::new(),
            urgency_high_ratio: 0.0,
            negative_sentiment_ratio: 0.0,
            hourly_trend: Vec::new(),
            top_keywords: Vec::new(),
            at_risk_customers: Vec::new(),
        }
    }
}
