// [libs/infra/db/src/schema.rs]
/*!
 * =================================================================
 * APARATO: DATABASE SCHEMA
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN IDEMPOTENTE DE TABLAS E ÍNDICES
 *
 * `CREATE TABLE IF NOT EXISTS` plus a fixed index set applied on every
 * boot. No migration framework: the schema is small and closed, so a
 * flat idempotent script is enough.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument};

const TABLES: &[(&str, &str)] = &[
    ("TABLE_TICKETS", r#"
        CREATE TABLE IF NOT EXISTS tickets (
            id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            external_id TEXT NOT NULL,
            customer_id TEXT NOT NULL,
            source TEXT NOT NULL,
            subject TEXT NOT NULL,
            message TEXT NOT NULL,
            status TEXT NOT NULL,
            urgency TEXT NOT NULL,
            sentiment TEXT NOT NULL,
            requires_action INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT,
            UNIQUE(tenant_id, external_id)
        );
    "#),
    ("TABLE_INGESTION_JOBS", r#"
        CREATE TABLE IF NOT EXISTS ingestion_jobs (
            job_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            total_pages INTEGER NOT NULL DEFAULT 0,
            processed_pages INTEGER NOT NULL DEFAULT 0,
            progress INTEGER NOT NULL DEFAULT 0
        );
    "#),
    ("TABLE_INGESTION_LOGS", r#"
        CREATE TABLE IF NOT EXISTS ingestion_logs (
            log_id TEXT PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            job_id TEXT NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT NOT NULL,
            new_ingested INTEGER NOT NULL DEFAULT 0,
            updated INTEGER NOT NULL DEFAULT 0,
            errors INTEGER NOT NULL DEFAULT 0,
            error TEXT
        );
    "#),
    ("TABLE_TICKET_HISTORY", r#"
        CREATE TABLE IF NOT EXISTS ticket_history (
            history_id TEXT PRIMARY KEY,
            ticket_id TEXT NOT NULL,
            tenant_id TEXT NOT NULL,
            action TEXT NOT NULL,
            changes_json TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );
    "#),
    ("TABLE_DISTRIBUTED_LOCKS", r#"
        CREATE TABLE IF NOT EXISTS distributed_locks (
            resource_id TEXT PRIMARY KEY,
            owner_id TEXT NOT NULL,
            acquired_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        );
    "#),
];

const INDEXES: &[(&str, &str)] = &[
    ("IDX_TICKETS_TENANT_STATUS", "CREATE INDEX IF NOT EXISTS idx_tickets_tenant_status ON tickets(tenant_id, status);"),
    ("IDX_TICKETS_TENANT_URGENCY", "CREATE INDEX IF NOT EXISTS idx_tickets_tenant_urgency ON tickets(tenant_id, urgency);"),
    ("IDX_TICKETS_TENANT_CREATED", "CREATE INDEX IF NOT EXISTS idx_tickets_tenant_created ON tickets(tenant_id, created_at);"),
    ("IDX_TICKETS_TENANT_CUSTOMER", "CREATE INDEX IF NOT EXISTS idx_tickets_tenant_customer ON tickets(tenant_id, customer_id);"),
    ("IDX_TICKETS_DELETED", "CREATE INDEX IF NOT EXISTS idx_tickets_deleted_at ON tickets(deleted_at);"),
    ("IDX_JOBS_TENANT_STATUS", "CREATE INDEX IF NOT EXISTS idx_jobs_tenant_status ON ingestion_jobs(tenant_id, status);"),
    ("IDX_LOGS_TENANT", "CREATE INDEX IF NOT EXISTS idx_logs_tenant ON ingestion_logs(tenant_id, started_at);"),
    ("IDX_HISTORY_TICKET", "CREATE INDEX IF NOT EXISTS idx_history_ticket ON ticket_history(tenant_id, ticket_id);"),
];

#[instrument(skip(connection))]
pub async fn apply_schema(connection: &Connection) -> Result<()> {
    info!("applying database schema");

    for (identifier, sql) in TABLES {
        debug!(table = identifier, "creating table");
        connection
            .execute(sql, ())
            .await
            .with_context(|| format!("failed to create table for {identifier}"))?;
    }

    for (identifier, sql) in INDEXES {
        debug!(index = identifier, "creating index");
        connection
            .execute(sql, ())
            .await
            .with_context(|| format!("failed to create index {identifier}"))?;
    }

    info!("schema is up to date");
    Ok(())
}
