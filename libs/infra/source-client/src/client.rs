// [libs/infra/source-client/src/client.rs]
/*!
 * =================================================================
 * APARATO: EXTERNAL TICKET SOURCE CLIENT
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: PAGINACIÓN Y REINTENTO CONTRA EL ORIGEN EXTERNO
 *
 * `fetch_page` owns its own retry loop: a 429 waits out the server's
 * `Retry-After` (or a default) and tries again without counting against
 * the attempt budget, while a 5xx or network fault consumes one of
 * `MAX_ATTEMPTS` retries with exponential backoff. Anything else (4xx
 * other than 429) is not retried.
 * =================================================================
 */

use crate::errors::ClientError;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ticketflow_domain_models::ExternalTicket;
use tracing::{info, instrument, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ATTEMPTS: u32 = 3;
const BASE_RETRY_DELAY: Duration = Duration::from_millis(250);
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Deserialize)]
pub struct SourcePage {
    pub tickets: Vec<ExternalTicket>,
    pub page: u32,
    pub total_pages: u32,
}

impl SourcePage {
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Serialize)]
struct PageRequest<'a> {
    tenant_id: &'a str,
    page: u32,
    page_size: u32,
}

pub struct SourceClient {
    http: Client,
    base_url: String,
}

impl SourceClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::builder()
                .user_agent("ticketflow-ingestor/0.1")
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build source-client http client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_page(&self, tenant_id: &str, page: u32, page_size: u32) -> Result<SourcePage, ClientError> {
        let url = format!("{}/tickets", self.base_url);
        let query = PageRequest { tenant_id, page, page_size };

        let mut attempt = 0;
        loop {
            let response = self.http.get(&url).query(&query).send().await;

            let response = match response {
                Ok(response) => response,
                Err(network_error) => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        return Err(ClientError::RetriesExhausted(attempt));
                    }
                    warn!(attempt, error = %network_error, "source fetch network error, retrying");
                    tokio::time::sleep(backoff_for_attempt(attempt)).await;
                    continue;
                }
            };

            match response.status() {
                StatusCode::OK => {
                    return Ok(response.json::<SourcePage>().await?);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let wait = retry_after(&response).unwrap_or(DEFAULT_RATE_LIMIT_WAIT);
                    info!(wait_ms = wait.as_millis() as u64, "source rate-limited this page fetch");
                    tokio::time::sleep(wait).await;
                    continue;
                }
                status if status.is_server_error() => {
                    attempt += 1;
                    if attempt >= MAX_ATTEMPTS {
                        return Err(ClientError::ServerRejection(status.as_u16()));
                    }
                    warn!(attempt, status = status.as_u16(), "source server error, retrying");
                    tokio::time::sleep(backoff_for_attempt(attempt)).await;
                    continue;
                }
                status => {
                    return Err(ClientError::ServerRejection(status.as_u16()));
                }
            }
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn backoff_for_attempt(attempt: u32) -> Duration {
    BASE_RETRY_DELAY.saturating_mul(1u32 << attempt.min(4))
}
