// [libs/infra/db/src/client.rs]
/*!
 * =================================================================
 * APARATO: DATABASE CONNECTION CLIENT
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y PERSISTENCIA ACID
 *
 * libSQL's embedded driver opens one connection per `connect()` call;
 * there is no pool to size. For `:memory:` URLs the first connection is
 * kept alive for the client's whole lifetime as an anchor, otherwise
 * SQLite drops the in-memory database the moment its last connection
 * closes and every subsequent connect() would see an empty schema.
 * =================================================================
 */

use crate::errors::DbError;
use crate::schema::apply_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

#[derive(Clone)]
pub struct DatabaseClient {
    driver: Arc<Database>,
    _memory_anchor: Option<Arc<Connection>>,
}

impl DatabaseClient {
    #[instrument(skip(auth_token))]
    pub async fn connect(url: &str, auth_token: Option<String>) -> Result<Self, DbError> {
        if url.is_empty() {
            return Err(DbError::ConfigurationError("database url is empty".into()));
        }

        info!(url, "connecting to database");

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");

        let driver = if is_remote {
            let token = auth_token
                .ok_or_else(|| DbError::ConfigurationError("remote database requires an auth token".into()))?;
            Builder::new_remote(url.to_string(), token).build().await
        } else {
            Builder::new_local(url).build().await
        }
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let driver = Arc::new(driver);
        let mut anchor = None;

        if is_memory {
            let anchor_connection = driver
                .connect()
                .map_err(|e| DbError::ConnectionError(format!("failed to open memory anchor: {e}")))?;
            apply_schema(&anchor_connection)
                .await
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
            anchor = Some(Arc::new(anchor_connection));
        } else {
            let bootstrap_connection = driver
                .connect()
                .map_err(|e| DbError::ConnectionError(format!("failed to open bootstrap connection: {e}")))?;
            apply_schema(&bootstrap_connection)
                .await
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        }

        Ok(Self {
            driver,
            _memory_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.driver.connect().map_err(|e| {
            error!(error = %e, "failed to allocate connection");
            DbError::ConnectionError(e.to_string())
        })
    }

    /// Cheapest possible round-trip, used by the readiness probe.
    pub async fn health_check(&self) -> Result<(), DbError> {
        let connection = self.get_connection()?;
        connection.query("SELECT 1", ()).await?;
        Ok(())
    }
}
