// [libs/infra/db/src/repositories/analytics.rs]
/*!
 * Dashboard aggregates. Most facets are their own indexed query against
 * the same consistent read of `tickets`; `top_keywords` is the
 * exception — it tokenizes `subject`/`message` in the application after
 * a single text-only fetch, since SQLite has no built-in tokenizer. An
 * empty tenant returns zeroed structures, never an error — see
 * `DashboardStats::empty`.
 */

use std::collections::HashMap;

use crate::errors::DbError;
use crate::DatabaseClient;
use libsql::params;
use ticketflow_domain_models::{DashboardStats, HourlyBucket, KeywordCount, RiskyCustomer, StatusCount};
use tracing::instrument;

const TOP_KEYWORDS_LIMIT: usize = 10;
const AT_RISK_CUSTOMERS_LIMIT: i64 = 5;
const HOURLY_TREND_BUCKETS: i64 = 24;
const MIN_KEYWORD_LEN: usize = 3;

/// Closed-class words excluded from the keyword frequency count. Not a
/// stemmer or a full stopword corpus, just enough to keep filler words
/// out of the top-N list.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "be", "been", "being", "to", "of", "in",
    "on", "at", "for", "with", "as", "by", "this", "that", "these", "those", "it", "its", "i", "we", "you",
    "your", "my", "me", "please", "have", "has", "had", "can", "could", "would", "will", "not", "no", "do",
    "does", "did", "so", "if", "from", "about", "us", "our", "am", "im", "get", "got", "just", "up", "out",
];

pub struct AnalyticsRepository {
    database_client: DatabaseClient,
}

impl AnalyticsRepository {
    pub fn new(database_client: DatabaseClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self, tenant_id: &str) -> Result<DashboardStats, DbError> {
        let connection = self.database_client.get_connection()?;

        let total_tickets = count_total(&connection, tenant_id).await?;
        if total_tickets == 0 {
            return Ok(DashboardStats::empty());
        }

        let by_status = status_breakdown(&connection, tenant_id).await?;
        let urgency_high_count = count_where(&connection, tenant_id, "urgency = 'high'").await?;
        let negative_sentiment_count = count_where(&connection, tenant_id, "sentiment = 'negative'").await?;
        let hourly_trend = hourly_trend(&connection, tenant_id).await?;
        let top_keywords = top_keywords(&connection, tenant_id).await?;
        let at_risk_customers = at_risk_customers(&connection, tenant_id).await?;

        Ok(DashboardStats {
            total_tickets,
            by_status,
            urgency_high_ratio: urgency_high_count as f64 / total_tickets as f64,
            negative_sentiment_ratio: negative_sentiment_count as f64 / total_tickets as f64,
            hourly_trend,
            top_keywords,
            at_risk_customers,
        })
    }
}

async fn count_total(connection: &libsql::Connection, tenant_id: &str) -> Result<i64, DbError> {
    let mut rows = connection
        .query(
            "SELECT COUNT(*) FROM tickets WHERE tenant_id = ?1 AND deleted_at IS NULL",
            params![tenant_id],
        )
        .await?;
    let row = rows.next().await?.expect("COUNT(*) always returns one row");
    Ok(row.get(0)?)
}

async fn count_where(connection: &libsql::Connection, tenant_id: &str, predicate: &str) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM tickets WHERE tenant_id = ?1 AND deleted_at IS NULL AND {predicate}");
    let mut rows = connection.query(&sql, params![tenant_id]).await?;
    let row = rows.next().await?.expect("COUNT(*) always returns one row");
    Ok(row.get(0)?)
}

async fn status_breakdown(connection: &libsql::Connection, tenant_id: &str) -> Result<Vec<StatusCount>, DbError> {
    let mut rows = connection
        .query(
            "SELECT status, COUNT(*) FROM tickets WHERE tenant_id = ?1 AND deleted_at IS NULL
             GROUP BY status ORDER BY COUNT(*) DESC",
            params![tenant_id],
        )
        .await?;

    let mut result = Vec::new();
    while let Some(row) = rows.next().await? {
        result.push(StatusCount {
            status: row.get(0)?,
            count: row.get(1)?,
        });
    }
    Ok(result)
}

async fn hourly_trend(connection: &libsql::Connection, tenant_id: &str) -> Result<Vec<HourlyBucket>, DbError> {
    let mut rows = connection
        .query(
            "SELECT strftime('%Y-%m-%dT%H:00:00Z', created_at) AS hour, COUNT(*) FROM tickets
             WHERE tenant_id = ?1 AND deleted_at IS NULL
             GROUP BY hour ORDER BY hour DESC LIMIT ?2",
            params![tenant_id, HOURLY_TREND_BUCKETS],
        )
        .await?;

    let mut result = Vec::new();
    while let Some(row) = rows.next().await? {
        result.push(HourlyBucket {
            hour: row.get(0)?,
            count: row.get(1)?,
        });
    }
    result.reverse();
    Ok(result)
}

async fn top_keywords(connection: &libsql::Connection, tenant_id: &str) -> Result<Vec<KeywordCount>, DbError> {
    let mut rows = connection
        .query(
            "SELECT subject, message FROM tickets WHERE tenant_id = ?1 AND deleted_at IS NULL",
            params![tenant_id],
        )
        .await?;

    let mut frequencies: HashMap<String, i64> = HashMap::new();
    while let Some(row) = rows.next().await? {
        let subject: String = row.get(0)?;
        let message: String = row.get(1)?;
        for token in tokenize(&subject).chain(tokenize(&message)) {
            *frequencies.entry(token).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<KeywordCount> = frequencies
        .into_iter()
        .map(|(keyword, count)| KeywordCount { keyword, count })
        .collect();

    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
    counts.truncate(TOP_KEYWORDS_LIMIT);
    Ok(counts)
}

/// Lowercases, splits on non-alphanumeric boundaries, and drops stopwords
/// and anything shorter than `MIN_KEYWORD_LEN`.
fn tokenize(text: &str) -> impl Iterator<Item = String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() >= MIN_KEYWORD_LEN)
        .filter(|word| !STOPWORDS.contains(word))
        .map(|word| word.to_string())
        .collect::<Vec<_>>()
        .into_iter()
}

async fn at_risk_customers(connection: &libsql::Connection, tenant_id: &str) -> Result<Vec<RiskyCustomer>, DbError> {
    let mut rows = connection
        .query(
            "SELECT customer_id, COUNT(*) FROM tickets
             WHERE tenant_id = ?1 AND deleted_at IS NULL AND urgency = 'high'
             GROUP BY customer_id ORDER BY COUNT(*) DESC LIMIT ?2",
            params![tenant_id, AT_RISK_CUSTOMERS_LIMIT],
        )
        .await?;

    let mut result = Vec::new();
    while let Some(row) = rows.next().await? {
        result.push(RiskyCustomer {
            customer_id: row.get(0)?,
            high_urgency_count: row.get(1)?,
        });
    }
    Ok(result)
}
