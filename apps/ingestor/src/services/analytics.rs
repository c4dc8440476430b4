// [apps/ingestor/src/services/analytics.rs]
/*!
 * Thin pass-through to `AnalyticsRepository`. Kept as its own service
 * rather than calling the repository directly from the handler so the
 * handler layer never imports `ticketflow-infra-db` types beyond the
 * plain `DashboardStats` struct.
 */

use std::sync::Arc;

use ticketflow_domain_models::DashboardStats;
use ticketflow_infra_db::{AnalyticsRepository, DbError};

pub struct AnalyticsService {
    repository: Arc<AnalyticsRepository>,
}

impl AnalyticsService {
    pub fn new(repository: Arc<AnalyticsRepository>) -> Self {
        Self { repository }
    }

    pub async fn dashboard(&self, tenant_id: &str) -> Result<DashboardStats, DbError> {
        self.repository.dashboard_stats(tenant_id).await
    }
}
