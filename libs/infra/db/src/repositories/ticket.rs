// [libs/infra/db/src/repositories/ticket.rs]
/*!
 * Ticket CRUD. `upsert` is the single write path SyncEngine drives: it
 * always knows in advance (via `find_by_external_id`) whether it is
 * inserting or updating, so this repository never needs an UPSERT
 * statement of its own — only a plain INSERT and a plain UPDATE.
 */

use crate::errors::DbError;
use crate::DatabaseClient;
use chrono::{DateTime, Utc};
use libsql::params;
use std::str::FromStr;
use ticketflow_domain_models::{Sentiment, Ticket, Urgency};
use tracing::instrument;

pub struct TicketRepository {
    database_client: DatabaseClient,
}

impl TicketRepository {
    pub fn new(database_client: DatabaseClient) -> Self {
        Self { database_client }
    }

    #[instrument(skip(self))]
    pub async fn find_by_external_id(
        &self,
        tenant_id: &str,
        external_id: &str,
    ) -> Result<Option<(String, Ticket)>, DbError> {
        let connection = self.database_client.get_connection()?;

        let mut rows = connection
            .query(
                "SELECT id, tenant_id, external_id, customer_id, source, subject, message, status,
                        urgency, sentiment, requires_action, created_at, updated_at, deleted_at
                 FROM tickets WHERE tenant_id = ?1 AND external_id = ?2",
                params![tenant_id, external_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row_to_ticket(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, ticket))]
    pub async fn insert(&self, ticket: &Ticket) -> Result<String, DbError> {
        let connection = self.database_client.get_connection()?;
        let id = uuid::Uuid::new_v4().to_string();

        connection
            .execute(
                "INSERT INTO tickets (id, tenant_id, external_id, customer_id, source, subject, message,
                    status, urgency, sentiment, requires_action, created_at, updated_at, deleted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, NULL)",
                params![
                    id.clone(),
                    ticket.tenant_id.clone(),
                    ticket.external_id.clone(),
                    ticket.customer_id.clone(),
                    ticket.source.clone(),
                    ticket.subject.clone(),
                    ticket.message.clone(),
                    ticket.status.clone(),
                    ticket.urgency.as_str(),
                    ticket.sentiment.as_str(),
                    ticket.requires_action as i64,
                    ticket.created_at.to_rfc3339(),
                    ticket.updated_at.to_rfc3339(),
                ],
            )
            .await?;

        Ok(id)
    }

    #[instrument(skip(self, ticket))]
    pub async fn update(&self, id: &str, ticket: &Ticket) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let changed = connection
            .execute(
                "UPDATE tickets SET customer_id = ?1, source = ?2, subject = ?3, message = ?4,
                    status = ?5, urgency = ?6, sentiment = ?7, requires_action = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    ticket.customer_id.clone(),
                    ticket.source.clone(),
                    ticket.subject.clone(),
                    ticket.message.clone(),
                    ticket.status.clone(),
                    ticket.urgency.as_str(),
                    ticket.sentiment.as_str(),
                    ticket.requires_action as i64,
                    ticket.updated_at.to_rfc3339(),
                    id,
                ],
            )
            .await?;

        if changed == 0 {
            return Err(DbError::TicketNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: &str, deleted_at: DateTime<Utc>) -> Result<(), DbError> {
        let connection = self.database_client.get_connection()?;

        let changed = connection
            .execute(
                "UPDATE tickets SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                params![deleted_at.to_rfc3339(), id],
            )
            .await?;

        if changed == 0 {
            return Err(DbError::TicketNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_active_external_ids(&self, tenant_id: &str) -> Result<Vec<(String, String)>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, external_id FROM tickets WHERE tenant_id = ?1 AND deleted_at IS NULL",
                params![tenant_id],
            )
            .await?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            let external_id: String = row.get(1)?;
            result.push((id, external_id));
        }
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn list_by_tenant(
        &self,
        tenant_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, tenant_id, external_id, customer_id, source, subject, message, status,
                        urgency, sentiment, requires_action, created_at, updated_at, deleted_at
                 FROM tickets
                 WHERE tenant_id = ?1 AND deleted_at IS NULL
                 ORDER BY created_at DESC
                 LIMIT ?2 OFFSET ?3",
                params![tenant_id, limit, offset],
            )
            .await?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().await? {
            let (_, ticket) = row_to_ticket(&row)?;
            result.push(ticket);
        }
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn list_urgent(&self, tenant_id: &str, limit: i64, offset: i64) -> Result<Vec<Ticket>, DbError> {
        let connection = self.database_client.get_connection()?;
        let mut rows = connection
            .query(
                "SELECT id, tenant_id, external_id, customer_id, source, subject, message, status,
                        urgency, sentiment, requires_action, created_at, updated_at, deleted_at
                 FROM tickets
                 WHERE tenant_id = ?1 AND deleted_at IS NULL AND urgency = 'high'
                 ORDER BY created_at DESC
                 LIMIT ?2 OFFSET ?3",
                params![tenant_id, limit, offset],
            )
            .await?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().await? {
            let (_, ticket) = row_to_ticket(&row)?;
            result.push(ticket);
        }
        Ok(result)
    }
}

fn row_to_ticket(row: &libsql::Row) -> Result<(String, Ticket), DbError> {
    let id: String = row.get(0)?;
    let deleted_at_raw: Option<String> = row.get(13)?;

    let ticket = Ticket {
        tenant_id: row.get(1)?,
        external_id: row.get(2)?,
        customer_id: row.get(3)?,
        source: row.get(4)?,
        subject: row.get(5)?,
        message: row.get(6)?,
        status: row.get(7)?,
        urgency: parse_urgency(&row.get::<String>(8)?)?,
        sentiment: parse_sentiment(&row.get::<String>(9)?)?,
        requires_action: row.get::<i64>(10)? != 0,
        created_at: parse_timestamp(&row.get::<String>(11)?)?,
        updated_at: parse_timestamp(&row.get::<String>(12)?)?,
        deleted_at: deleted_at_raw.map(|raw| parse_timestamp(&raw)).transpose()?,
    };

    Ok((id, ticket))
}

fn parse_urgency(raw: &str) -> Result<Urgency, DbError> {
    Urgency::from_str(raw).map_err(DbError::MappingError)
}

fn parse_sentiment(raw: &str) -> Result<Sentiment, DbError> {
    Sentiment::from_str(raw).map_err(DbError::MappingError)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| DbError::MappingError(format!("invalid timestamp '{raw}': {e}")))
}
