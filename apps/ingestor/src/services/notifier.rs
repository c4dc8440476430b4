// [apps/ingestor/src/services/notifier.rs]
/*!
 * Outbound alert delivery. `IngestOrchestrator` only ever pushes a
 * `NotificationPayload` onto a bounded channel; everything past that —
 * the HTTP send, the retry loop, the circuit breaker and rate limiter
 * gating — lives here, in the only layer allowed to own an outbound
 * client for this traffic (spec §4.6).
 */

use std::time::Duration;

use reqwest::{Client, StatusCode};
use ticketflow_core_circuit_breaker::CircuitBreakerRegistry;
use ticketflow_core_rate_limiter::RateLimiter;
use ticketflow_domain_notification::{NotificationOutcome, NotificationPayload, RetryPolicy};
use tokio::sync::{mpsc, Mutex};
use std::sync::Arc;
use tracing::{info, warn};

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);
const CIRCUIT_NAME: &str = "notify";

pub struct NotifierClient {
    http: Client,
    base_url: String,
}

impl NotifierClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(NOTIFY_TIMEOUT)
                .build()
                .expect("failed to build notifier http client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let url = format!("{}/notifications", self.base_url);
        let response = self.http.post(&url).json(payload).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::TOO_MANY_REQUESTS => {
                let wait = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(NotifyError::RateLimited(wait))
            }
            status => Err(NotifyError::Rejected(status.as_u16())),
        }
    }
}

enum NotifyError {
    Transport(reqwest::Error),
    RateLimited(Option<Duration>),
    Rejected(u16),
}

impl From<reqwest::Error> for NotifyError {
    fn from(error: reqwest::Error) -> Self {
        NotifyError::Transport(error)
    }
}

/// Spawns `pool_size` long-lived workers sharing one receiver. Workers
/// live for the process lifetime, not per ingestion run — per spec §4.6
/// ambient detail in SPEC_FULL.md §4.6.
pub fn spawn_notifier_pool(
    pool_size: usize,
    receiver: mpsc::Receiver<NotificationPayload>,
    client: Arc<NotifierClient>,
    rate_limiter: RateLimiter,
    circuit_breakers: Arc<CircuitBreakerRegistry>,
) {
    let shared_receiver = Arc::new(Mutex::new(receiver));

    for worker_id in 0..pool_size {
        let shared_receiver = shared_receiver.clone();
        let client = client.clone();
        let rate_limiter = rate_limiter.clone();
        let circuit_breakers = circuit_breakers.clone();

        tokio::spawn(async move {
            info!(worker_id, "notifier worker started");
            loop {
                let payload = {
                    let mut receiver = shared_receiver.lock().await;
                    receiver.recv().await
                };

                let Some(payload) = payload else {
                    info!(worker_id, "notifier channel closed, worker exiting");
                    break;
                };

                let outcome = deliver(&client, &rate_limiter, &circuit_breakers, &payload).await;
                if !matches!(outcome, NotificationOutcome::Delivered) {
                    warn!(ticket_id = %payload.ticket_id, outcome = ?outcome, "notification not delivered");
                }
            }
        });
    }
}

async fn deliver(
    client: &NotifierClient,
    rate_limiter: &RateLimiter,
    circuit_breakers: &CircuitBreakerRegistry,
    payload: &NotificationPayload,
) -> NotificationOutcome {
    let breaker = circuit_breakers.get_or_create(CIRCUIT_NAME);
    let policy = RetryPolicy::default();

    let mut attempt = 0;
    loop {
        if !breaker.allow() {
            return NotificationOutcome::CircuitOpen;
        }

        rate_limiter.acquire().await;

        match client.send(payload).await {
            Ok(()) => {
                breaker.record_success();
                return NotificationOutcome::Delivered;
            }
            Err(NotifyError::RateLimited(server_hint)) => {
                let wait = policy.retry_after_override(server_hint.unwrap_or(Duration::from_secs(1)));
                tokio::time::sleep(wait).await;
                continue;
            }
            Err(error) => {
                let message = match &error {
                    NotifyError::Transport(source) => source.to_string(),
                    NotifyError::Rejected(status) => format!("rejected with HTTP {status}"),
                    NotifyError::RateLimited(_) => unreachable!("handled above"),
                };

                // Only timeouts, connection errors, and HTTP >= 500 count as
                // breaker failures and get retried. A non-429 4xx is a
                // permanently rejected payload: fail fast, don't retry, and
                // don't let it trip an unrelated breaker.
                let is_breaker_failure = match &error {
                    NotifyError::Transport(_) => true,
                    NotifyError::Rejected(status) => *status >= 500,
                    NotifyError::RateLimited(_) => unreachable!("handled above"),
                };

                if !is_breaker_failure {
                    return NotificationOutcome::Failed(message);
                }

                breaker.record_failure();

                match policy.backoff_for_attempt(attempt) {
                    Some(delay) => {
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    None => return NotificationOutcome::Failed(message),
                }
            }
        }
    }
}
