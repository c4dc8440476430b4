// [libs/domain/notification/src/lib.rs]
/*!
 * =================================================================
 * APARATO: NOTIFICATION CONTRACTS & RETRY POLICY
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: FORMA DEL PAYLOAD SALIENTE Y POLÍTICA DE REINTENTO
 *
 * Pure types and pure backoff math only — no HTTP client lives here.
 * The send loop (rate limiter + circuit breaker + actual delivery)
 * belongs to the app layer, which is the only place allowed to own an
 * outbound client.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use typeshare::typeshare;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationSeverity {
    Info,
    Warning,
    Critical,
}

/// One outbound alert, e.g. "this tenant has a high-urgency ticket that
/// requires action."
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub id: String,
    pub tenant_id: String,
    pub ticket_id: String,
    pub severity: NotificationSeverity,
    pub subject: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationPayload {
    pub fn for_high_urgency_ticket(tenant_id: &str, ticket_id: &str, subject: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            ticket_id: ticket_id.to_string(),
            severity: NotificationSeverity::Critical,
            subject: subject.to_string(),
            reason: "ticket classified as high urgency and requires action".to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Terminal result of attempting to deliver a `NotificationPayload`.
/// `RateLimited` and `CircuitOpen` are distinguished from `Failed` because
/// the caller treats them differently: the former two are expected
/// backpressure signals, the latter is an actual delivery error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Delivered,
    RateLimited,
    CircuitOpen,
    Failed(String),
}

/// Bounded exponential backoff with full jitter, capped at three
/// attempts total (one initial send plus two retries).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// `attempt` is zero-based (0 = first retry after the initial send).
    /// Returns `None` once `attempt` exhausts `max_attempts`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        let exponent = attempt.min(16);
        let uncapped = self.base_delay.saturating_mul(1u32 << exponent);
        let capped = uncapped.min(self.max_delay);
        let jittered_millis = rand::random::<f64>() * capped.as_millis() as f64;
        Some(Duration::from_millis(jittered_millis as u64))
    }

    /// Honors a server-supplied `Retry-After` duration for a 429 response
    /// instead of computing our own backoff.
    pub fn retry_after_override(&self, server_hint: Duration) -> Duration {
        server_hint.min(self.max_delay.max(server_hint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_none_once_attempts_are_exhausted() {
        let policy = RetryPolicy::default();
        assert!(policy.backoff_for_attempt(0).is_some());
        assert!(policy.backoff_for_attempt(1).is_some());
        assert!(policy.backoff_for_attempt(2).is_none());
    }

    #[test]
    fn backoff_never_exceeds_max_delay() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
        };
        for attempt in 0..8 {
            if let Some(delay) = policy.backoff_for_attempt(attempt) {
                assert!(delay <= Duration::from_secs(3));
            }
        }
    }

    #[test]
    fn retry_after_override_passes_through_server_hint() {
        let policy = RetryPolicy::default();
        let hint = Duration::from_secs(2);
        assert_eq!(policy.retry_after_override(hint), hint);
    }
}
