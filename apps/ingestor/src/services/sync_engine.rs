// [apps/ingestor/src/services/sync_engine.rs]
/*!
 * Reconciles one externally-fetched ticket against the store: classify,
 * diff against the existing row (if any), and write exactly the rows
 * that changed. The `(tenant_id, external_id)` unique index plus this
 * find-then-write pattern is what keeps re-running ingestion against an
 * unchanged upstream a no-op (spec §8 invariant 5).
 */

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use ticketflow_domain_classifier::classify;
use ticketflow_domain_models::{FieldChange, HistoryAction, Ticket, TicketHistoryEntry, DIFFABLE_FIELDS};
use ticketflow_domain_models::{ExternalTicket, Urgency};
use ticketflow_infra_db::{DbError, HistoryRepository, TicketRepository};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct SyncResult {
    pub ticket_id: String,
    pub outcome: SyncOutcome,
    pub urgency: Urgency,
    pub requires_action: bool,
    pub subject: String,
}

impl SyncResult {
    /// New or changed high-urgency tickets are the only ones that warrant
    /// a notification — spec §4.8.
    pub fn warrants_notification(&self) -> bool {
        self.outcome != SyncOutcome::Unchanged && self.urgency == Urgency::High
    }
}

pub struct SyncEngine {
    ticket_repository: std::sync::Arc<TicketRepository>,
    history_repository: std::sync::Arc<HistoryRepository>,
}

impl SyncEngine {
    pub fn new(
        ticket_repository: std::sync::Arc<TicketRepository>,
        history_repository: std::sync::Arc<HistoryRepository>,
    ) -> Self {
        Self {
            ticket_repository,
            history_repository,
        }
    }

    #[instrument(skip(self, external))]
    pub async fn sync(
        &self,
        tenant_id: &str,
        external: &ExternalTicket,
        now: DateTime<Utc>,
    ) -> Result<SyncResult, DbError> {
        let classification = classify(&external.subject, &external.message);

        match self.ticket_repository.find_by_external_id(tenant_id, &external.external_id).await? {
            None => {
                let ticket = Ticket {
                    tenant_id: tenant_id.to_string(),
                    external_id: external.external_id.clone(),
                    customer_id: external.customer_id.clone(),
                    source: external.source.clone(),
                    subject: external.subject.clone(),
                    message: external.message.clone(),
                    status: external.status.clone(),
                    urgency: classification.urgency,
                    sentiment: classification.sentiment,
                    requires_action: classification.requires_action,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                };
                let ticket_id = self.ticket_repository.insert(&ticket).await?;

                self.history_repository
                    .insert(&TicketHistoryEntry {
                        history_id: uuid::Uuid::new_v4().to_string(),
                        ticket_id: ticket_id.clone(),
                        tenant_id: tenant_id.to_string(),
                        action: HistoryAction::Created,
                        changes: BTreeMap::new(),
                        recorded_at: now,
                    })
                    .await?;

                Ok(SyncResult {
                    ticket_id,
                    outcome: SyncOutcome::Created,
                    urgency: ticket.urgency,
                    requires_action: ticket.requires_action,
                    subject: ticket.subject,
                })
            }
            Some((ticket_id, existing)) => {
                if external.updated_at <= existing.updated_at {
                    return Ok(SyncResult {
                        ticket_id,
                        outcome: SyncOutcome::Unchanged,
                        urgency: existing.urgency,
                        requires_action: existing.requires_action,
                        subject: existing.subject,
                    });
                }

                let candidate = Ticket {
                    tenant_id: existing.tenant_id.clone(),
                    external_id: existing.external_id.clone(),
                    customer_id: external.customer_id.clone(),
                    source: external.source.clone(),
                    subject: external.subject.clone(),
                    message: external.message.clone(),
                    status: external.status.clone(),
                    urgency: classification.urgency,
                    sentiment: classification.sentiment,
                    requires_action: classification.requires_action,
                    created_at: existing.created_at,
                    updated_at: now,
                    deleted_at: existing.deleted_at,
                };

                let changes = diff(&existing, &candidate);
                if changes.is_empty() {
                    return Ok(SyncResult {
                        ticket_id,
                        outcome: SyncOutcome::Unchanged,
                        urgency: existing.urgency,
                        requires_action: existing.requires_action,
                        subject: existing.subject,
                    });
                }

                self.ticket_repository.update(&ticket_id, &candidate).await?;

                self.history_repository
                    .insert(&TicketHistoryEntry {
                        history_id: uuid::Uuid::new_v4().to_string(),
                        ticket_id: ticket_id.clone(),
                        tenant_id: tenant_id.to_string(),
                        action: HistoryAction::Updated,
                        changes,
                        recorded_at: now,
                    })
                    .await?;

                Ok(SyncResult {
                    ticket_id,
                    outcome: SyncOutcome::Updated,
                    urgency: candidate.urgency,
                    requires_action: candidate.requires_action,
                    subject: candidate.subject,
                })
            }
        }
    }

    /// Soft-deletes every active ticket for `tenant_id` whose external id
    /// was not observed in the just-completed fetch window, writing a
    /// `deleted` history row for each. Skipped entirely on a cancelled
    /// run per spec §4.8.
    #[instrument(skip(self, seen_external_ids))]
    pub async fn sweep_deleted(
        &self,
        tenant_id: &str,
        seen_external_ids: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Result<usize, DbError> {
        let active = self.ticket_repository.list_active_external_ids(tenant_id).await?;
        let mut deleted_count = 0;

        for (ticket_id, external_id) in active {
            if seen_external_ids.contains(&external_id) {
                continue;
            }

            self.ticket_repository.soft_delete(&ticket_id, now).await?;
            self.history_repository
                .insert(&TicketHistoryEntry {
                    history_id: uuid::Uuid::new_v4().to_string(),
                    ticket_id,
                    tenant_id: tenant_id.to_string(),
                    action: HistoryAction::Deleted,
                    changes: BTreeMap::new(),
                    recorded_at: now,
                })
                .await?;
            deleted_count += 1;
        }

        Ok(deleted_count)
    }
}

fn diff(existing: &Ticket, candidate: &Ticket) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();

    for field in DIFFABLE_FIELDS {
        let (old, new) = field_value(existing, field).zip(field_value(candidate, field)).unwrap();
        if old != new {
            changes.insert(
                field.to_string(),
                FieldChange {
                    old: Some(old),
                    new: Some(new),
                },
            );
        }
    }

    changes
}

fn field_value(ticket: &Ticket, field: &str) -> Option<String> {
    Some(match field {
        "subject" => ticket.subject.clone(),
        "message" => ticket.message.clone(),
        "status" => ticket.status.clone(),
        "urgency" => ticket.urgency.as_str().to_string(),
        "sentiment" => ticket.sentiment.as_str().to_string(),
        "requires_action" => ticket.requires_action.to_string(),
        "customer_id" => ticket.customer_id.clone(),
        "source" => ticket.source.clone(),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketflow_infra_db::DatabaseClient;

    async fn memory_engine() -> (SyncEngine, std::sync::Arc<TicketRepository>, std::sync::Arc<HistoryRepository>) {
        let client = DatabaseClient::connect(":memory:", None).await.unwrap();
        let tickets = std::sync::Arc::new(TicketRepository::new(client.clone()));
        let history = std::sync::Arc::new(HistoryRepository::new(client));
        (SyncEngine::new(tickets.clone(), history.clone()), tickets, history)
    }

    fn external(external_id: &str, subject: &str, message: &str) -> ExternalTicket {
        ExternalTicket {
            external_id: external_id.to_string(),
            customer_id: "cust-1".to_string(),
            source: "email".to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
            status: "open".to_string(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn first_sync_creates_and_records_history() {
        let (engine, _tickets, history) = memory_engine().await;
        let now = Utc::now();
        let result = engine.sync("t1", &external("ext-1", "Hello", "need help"), now).await.unwrap();
        assert_eq!(result.outcome, SyncOutcome::Created);

        let rows = history.list_by_ticket("t1", &result.ticket_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].action, HistoryAction::Created);
    }

    #[tokio::test]
    async fn resyncing_unchanged_ticket_is_a_no_op() {
        let (engine, _tickets, history) = memory_engine().await;
        let now = Utc::now();
        let first = engine.sync("t1", &external("ext-1", "Hello", "need help"), now).await.unwrap();
        let second = engine.sync("t1", &external("ext-1", "Hello", "need help"), now).await.unwrap();

        assert_eq!(second.outcome, SyncOutcome::Unchanged);
        assert_eq!(first.ticket_id, second.ticket_id);

        let rows = history.list_by_ticket("t1", &second.ticket_id).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn changed_field_produces_updated_outcome_and_history() {
        let (engine, _tickets, _history) = memory_engine().await;
        let now = Utc::now();
        let created = engine.sync("t1", &external("ext-1", "Hello", "need help"), now).await.unwrap();
        let updated = engine
            .sync("t1", &external("ext-1", "Hello", "this is now urgent, please fix"), now)
            .await
            .unwrap();

        assert_eq!(updated.outcome, SyncOutcome::Updated);
        assert_eq!(created.ticket_id, updated.ticket_id);
        assert!(updated.warrants_notification());
    }

    #[tokio::test]
    async fn sweep_soft_deletes_tickets_missing_from_the_seen_set() {
        let (engine, tickets, _history) = memory_engine().await;
        let now = Utc::now();
        engine.sync("t1", &external("a", "A", "a"), now).await.unwrap();
        engine.sync("t1", &external("b", "B", "b"), now).await.unwrap();

        let mut seen = HashSet::new();
        seen.insert("a".to_string());

        let deleted = engine.sweep_deleted("t1", &seen, now).await.unwrap();
        assert_eq!(deleted, 1);

        let active = tickets.list_active_external_ids("t1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].1, "a");
    }
}
