use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, Transaction as PgTransaction};
use tracing::{debug, error};

use crate::error::SqlExecError;
use crate::results::ResultSet;
use crate::transaction::{Database, Transaction};

use super::config::PostgresOptions;
use super::query::build_result_set_from_rows;

/// A `PostgreSQL` database reached through one client connection.
pub struct PostgresDatabase {
    client: Client,
    connection: JoinHandle<()>,
}

impl PostgresDatabase {
    /// Connect with the given options.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` for incomplete options or the driver's error if the
    /// connection cannot be established.
    pub async fn connect(opts: &PostgresOptions) -> Result<Self, SqlExecError> {
        let cfg = opts.to_pg_config()?;
        let (client, connection) = cfg.connect(NoTls).await?;
        let connection = tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!(error = %err, "postgres connection closed with an error");
            }
        });
        debug!(host = ?opts.host, dbname = ?opts.dbname, "connected to PostgreSQL");
        Ok(Self { client, connection })
    }

    /// Borrow the underlying client, e.g. to inspect state between runs.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl std::fmt::Debug for PostgresDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresDatabase")
            .field("closed", &self.client.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for PostgresDatabase {
    fn drop(&mut self) {
        self.connection.abort();
    }
}

/// Transaction handle on a [`PostgresDatabase`].
///
/// Statements go through the simple-query protocol, so text is sent verbatim and may hold
/// several statements. Dropping an unfinished handle rolls back.
pub struct PostgresTx<'a> {
    tx: PgTransaction<'a>,
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn begin(&mut self) -> Result<Box<dyn Transaction + '_>, SqlExecError> {
        let tx = self.client.transaction().await?;
        Ok(Box::new(PostgresTx { tx }))
    }
}

#[async_trait]
impl Transaction for PostgresTx<'_> {
    async fn execute(&mut self, sql: &str) -> Result<usize, SqlExecError> {
        let messages = self.tx.simple_query(sql).await?;
        let rows: u64 = messages
            .iter()
            .filter_map(|msg| match msg {
                SimpleQueryMessage::CommandComplete(n) => Some(*n),
                _ => None,
            })
            .sum();
        usize::try_from(rows).map_err(|e| {
            SqlExecError::ExecutionError(format!("Invalid rows affected count: {e}"))
        })
    }

    async fn query(&mut self, sql: &str) -> Result<ResultSet, SqlExecError> {
        let rows = self.tx.query(sql, &[]).await?;
        build_result_set_from_rows(&rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), SqlExecError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), SqlExecError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
