// [libs/infra/db/src/repositories/history.rs]
/*!
 * Ticket change history. `changes` is stored as a JSON blob rather than
 * normalized columns — the field set it covers is fixed
 * (`ticketflow_domain_models::DIFFABLE_FIELDS`) but small enough that a
 * relational shredding would only add joins without adding query power.
 */

use crate::errors::DbError;
use crate::DatabaseClient;
use libsql::params;
use ticketflow_domain_models::{HistoryAction, TicketHistoryEntry};
use tracing::instrument;

pub struct HistoryRepository {
    database_client: DatabaseClient,
}

impl HistoryRepository {
    pub fn new(database_client: DatabaseClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self, entry))]
    pub async fn insert(&self, entry: &TicketHistoryEntry) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;
        let changes_json = serde_json::to_string(&entry.changes)
            .map_err(|e| DbError::MappingError(format!("failed to serialize history changes: {e}")))?;

        connection
            .execute(
                "INSERT INTO ticket_history (history_id, ticket_id, tenant_id, action, changes_json, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.history_id.clone(),
                    entry.ticket_id.clone(),
                    entry.tenant_id.clone(),
                    entry.action.as_str(),
                    changes_json,
                    entry.recorded_at.to_rfc3339(),
                ],
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_by_ticket(&self, tenant_id: &str, ticket_id: &str) -> Result<Vec<TicketHistoryEntry>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT history_id, ticket_id, tenant_id, action, changes_json, recorded_at
                 FROM ticket_history WHERE tenant_id = ?1 AND ticket_id = ?2 ORDER BY recorded_at ASC",
                params![tenant_id, ticket_id],
            )
            .await?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().await? {
            let action_raw: String = row.get(3)?;
            let changes_json: String = row.get(4)?;

            result.push(TicketHistoryEntry {
                history_id: row.get(0)?,
                ticket_id: row.get(1)?,
                tenant_id: row.get(2)?,
                action: parse_action(&action_raw)?,
                changes: serde_json::from_str(&changes_json)
                    .map_err(|e| DbError::MappingError(format!("failed to deserialize history changes: {e}")))?,
                recorded_at: parse_timestamp(&row.get::<String>(5)?)?,
            });
        }
        Ok(result)
    }
}

fn parse_action(raw: &str) -> Result<HistoryAction, DbError> {
    match raw {
        "created" => Ok(HistoryAction::Created),
        "updated" => Ok(HistoryAction::Updated),
        "deleted" => Ok(HistoryAction::Deleted),
        other => Err(DbError::MappingError(format!("unrecognized history action '{other}'"))),
    }
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, DbError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&chrono::Utc))
        .map_err(|e| DbError::MappingError(format!("invalid timestamp '{raw}': {e}")))
}
