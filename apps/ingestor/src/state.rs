// [apps/ingestor/src/state.rs]
/*!
 * Shared application state. Everything here is `Clone` over an `Arc`
 * (or is itself `Arc`-backed internally) so a single `AppState` value
 * can be handed to every axum handler and every background task without
 * an extra layer of indirection at the call site.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use ticketflow_core_circuit_breaker::CircuitBreakerRegistry;
use ticketflow_core_lock_manager::LockManager;
use ticketflow_core_rate_limiter::RateLimiter;
use ticketflow_domain_notification::NotificationPayload;
use ticketflow_infra_db::{
    AnalyticsRepository, DatabaseClient, HistoryRepository, JobRepository, LockRepository, LogRepository,
    TicketRepository,
};
use ticketflow_infra_source_client::SourceClient;

use crate::config::IngestorConfig;
use crate::services::notifier::NotifierClient;

/// Per-job cancellation flag, looked up without contention per spec §5:
/// mutated only by the orchestrator that owns the job, and removed in
/// that job's guaranteed-release teardown.
pub type CancellationMap = Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>;

#[derive(Clone)]
pub struct AppState {
    pub database_client: DatabaseClient,
    pub ticket_repository: Arc<TicketRepository>,
    pub job_repository: Arc<JobRepository>,
    pub log_repository: Arc<LogRepository>,
    pub history_repository: Arc<HistoryRepository>,
    pub analytics_repository: Arc<AnalyticsRepository>,
    pub lock_manager: LockManager,
    pub rate_limiter: RateLimiter,
    pub circuit_breakers: Arc<CircuitBreakerRegistry>,
    pub source_client: Arc<SourceClient>,
    pub notifier_client: Arc<NotifierClient>,
    pub notifier_tx: mpsc::Sender<NotificationPayload>,
    pub cancellations: CancellationMap,
    pub lock_ttl: Duration,
    /// Last-known reachability of the external ticket source, updated by
    /// the fetch loop after every page request. `/health` reports this
    /// rather than probing the source itself.
    pub source_reachable: Arc<AtomicBool>,
}

/// Capacity of the notifier channel. A full channel drops the task with
/// a logged warning rather than ever blocking ingestion — spec §4.6.
const NOTIFIER_CHANNEL_CAPACITY: usize = 256;

impl AppState {
    pub async fn bootstrap(
        config: &IngestorConfig,
    ) -> Result<(Self, mpsc::Receiver<NotificationPayload>), anyhow::Error> {
        let database_client =
            DatabaseClient::connect(&config.database_url, config.database_auth_token.clone()).await?;

        let lock_repository = Arc::new(LockRepository::new(database_client.clone()));
        let lock_manager =
            LockManager::with_default_ttl(lock_repository, Duration::from_secs(config.lock_ttl_secs));

        let rate_limiter = RateLimiter::new(
            config.rate_limiter_capacity,
            Duration::from_secs(config.rate_limiter_window_secs),
        );

        let (notifier_tx, notifier_rx) = mpsc::channel(NOTIFIER_CHANNEL_CAPACITY);

        let state = Self {
            ticket_repository: Arc::new(TicketRepository::new(database_client.clone())),
            job_repository: Arc::new(JobRepository::new(database_client.clone())),
            log_repository: Arc::new(LogRepository::new(database_client.clone())),
            history_repository: Arc::new(HistoryRepository::new(database_client.clone())),
            analytics_repository: Arc::new(AnalyticsRepository::new(database_client.clone())),
            database_client,
            lock_manager,
            rate_limiter,
            circuit_breakers: Arc::new(CircuitBreakerRegistry::new()),
            source_client: Arc::new(SourceClient::new(config.external_source_base_url.clone())),
            notifier_client: Arc::new(NotifierClient::new(config.external_source_base_url.clone())),
            notifier_tx,
            cancellations: Arc::new(Mutex::new(HashMap::new())),
            lock_ttl: Duration::from_secs(config.lock_ttl_secs),
            source_reachable: Arc::new(AtomicBool::new(true)),
        };

        Ok((state, notifier_rx))
    }

    pub fn mark_source_reachable(&self, reachable: bool) {
        self.source_reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_source_reachable(&self) -> bool {
        self.source_reachable.load(Ordering::SeqCst)
    }

    pub async fn register_cancellation(&self, job_id: &str) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        self.cancellations.lock().await.insert(job_id.to_string(), flag.clone());
        flag
    }

    pub async fn request_cancellation(&self, job_id: &str) -> bool {
        match self.cancellations.lock().await.get(job_id) {
            Some(flag) => {
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub async fn clear_cancellation(&self, job_id: &str) {
        self.cancellations.lock().await.remove(job_id);
    }

    pub async fn is_running(&self, job_id: &str) -> bool {
        self.cancellations.lock().await.contains_key(job_id)
    }
}
