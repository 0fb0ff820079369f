//! An in-memory [`Database`] that records what it is asked to do.
//!
//! `ScriptedDatabase` never parses SQL. It appends a [`TxEvent`] for every call, keeps the
//! statements of committed transactions, and can be told to fail at a chosen point so executor
//! behavior can be checked without a real backend.
//!
//! With the `test-utils-postgres` feature, [`start_embedded_postgres`] also provides a throwaway
//! `PostgreSQL` server for backend tests.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::SqlExecError;
use crate::results::ResultSet;
use crate::transaction::{Database, Transaction};

#[cfg(feature = "test-utils-postgres")]
pub use self::embedded::{EmbeddedPostgres, start_embedded_postgres};

/// One call observed by [`ScriptedDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    Begin,
    Execute(String),
    Query(String),
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
pub struct ScriptedDatabase {
    events: Vec<TxEvent>,
    pending: Vec<String>,
    committed: Vec<String>,
    begins: usize,
    commits: usize,
    fail_begin_at: Option<usize>,
    fail_commit_at: Option<usize>,
    fail_statement: Option<String>,
    fail_rollback: bool,
    query_results: HashMap<String, ResultSet>,
}

impl ScriptedDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`th call to `begin` (zero based).
    #[must_use]
    pub fn fail_begin_at(mut self, n: usize) -> Self {
        self.fail_begin_at = Some(n);
        self
    }

    /// Fail the `n`th call to `commit` (zero based).
    #[must_use]
    pub fn fail_commit_at(mut self, n: usize) -> Self {
        self.fail_commit_at = Some(n);
        self
    }

    /// Fail any executed statement containing `needle`.
    #[must_use]
    pub fn fail_statement(mut self, needle: impl Into<String>) -> Self {
        self.fail_statement = Some(needle.into());
        self
    }

    /// Make every rollback report an error (after recording it).
    #[must_use]
    pub fn fail_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    /// Answer `query(sql)` with `result`. Unknown queries return an empty result set.
    #[must_use]
    pub fn with_query_result(mut self, sql: impl Into<String>, result: ResultSet) -> Self {
        self.query_results.insert(sql.into(), result);
        self
    }

    #[must_use]
    pub fn events(&self) -> &[TxEvent] {
        &self.events
    }

    /// Statements of every committed transaction, in execution order.
    #[must_use]
    pub fn committed(&self) -> &[String] {
        &self.committed
    }
}

#[async_trait]
impl Database for ScriptedDatabase {
    async fn begin(&mut self) -> Result<Box<dyn Transaction + '_>, SqlExecError> {
        let n = self.begins;
        self.begins += 1;
        if self.fail_begin_at == Some(n) {
            return Err(SqlExecError::ConnectionError(format!(
                "scripted failure on begin #{n}"
            )));
        }
        self.events.push(TxEvent::Begin);
        self.pending.clear();
        Ok(Box::new(ScriptedTx { db: self }))
    }
}

/// Transaction handle on a [`ScriptedDatabase`].
pub struct ScriptedTx<'a> {
    db: &'a mut ScriptedDatabase,
}

#[async_trait]
impl Transaction for ScriptedTx<'_> {
    async fn execute(&mut self, sql: &str) -> Result<usize, SqlExecError> {
        self.db.events.push(TxEvent::Execute(sql.to_string()));
        let fails = self
            .db
            .fail_statement
            .as_deref()
            .is_some_and(|needle| sql.contains(needle));
        if fails {
            return Err(SqlExecError::ExecutionError(format!(
                "scripted failure on statement: {sql}"
            )));
        }
        self.db.pending.push(sql.to_string());
        Ok(1)
    }

    async fn query(&mut self, sql: &str) -> Result<ResultSet, SqlExecError> {
        self.db.events.push(TxEvent::Query(sql.to_string()));
        Ok(self
            .db
            .query_results
            .get(sql)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit(self: Box<Self>) -> Result<(), SqlExecError> {
        let db = self.db;
        let n = db.commits;
        db.commits += 1;
        db.events.push(TxEvent::Commit);
        if db.fail_commit_at == Some(n) {
            db.pending.clear();
            return Err(SqlExecError::ExecutionError(format!(
                "scripted failure on commit #{n}"
            )));
        }
        db.committed.append(&mut db.pending);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), SqlExecError> {
        let db = self.db;
        db.events.push(TxEvent::Rollback);
        db.pending.clear();
        if db.fail_rollback {
            return Err(SqlExecError::ExecutionError(
                "scripted failure on rollback".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "test-utils-postgres")]
mod embedded {
    use postgresql_embedded::PostgreSQL;
    use tracing::{debug, warn};

    use crate::error::SqlExecError;
    use crate::postgres::PostgresOptions;

    /// A running embedded `PostgreSQL` server and the options that reach its test database.
    pub struct EmbeddedPostgres {
        pub postgresql: PostgreSQL,
        pub options: PostgresOptions,
    }

    impl EmbeddedPostgres {
        /// Stop the server. Failures are logged, not returned.
        pub async fn stop(self) {
            if let Err(err) = self.postgresql.stop().await {
                warn!(error = %err, "embedded postgres did not stop cleanly");
            }
        }
    }

    fn embedded_error(err: postgresql_embedded::Error) -> SqlExecError {
        SqlExecError::ConnectionError(format!("embedded postgres: {err}"))
    }

    /// Install (bundled binaries), start, and create `dbname` on a fresh embedded server.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConnectionError` if the server cannot be set up or started, or the
    /// database cannot be created.
    pub async fn start_embedded_postgres(dbname: &str) -> Result<EmbeddedPostgres, SqlExecError> {
        let mut postgresql = PostgreSQL::default();
        postgresql.setup().await.map_err(embedded_error)?;
        postgresql.start().await.map_err(embedded_error)?;
        postgresql
            .create_database(dbname)
            .await
            .map_err(embedded_error)?;

        let settings = postgresql.settings();
        let options = PostgresOptions::new()
            .host(settings.host.clone())
            .port(settings.port)
            .user(settings.username.clone())
            .password(settings.password.clone())
            .dbname(dbname);
        debug!(port = settings.port, dbname, "embedded postgres started");

        Ok(EmbeddedPostgres {
            postgresql,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rollback_discards_pending_statements() {
        let mut db = ScriptedDatabase::new();

        let mut tx = db.begin().await.unwrap();
        tx.execute("INSERT INTO t VALUES (1)").await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        tx.execute("INSERT INTO t VALUES (2)").await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(db.committed(), ["INSERT INTO t VALUES (1)"]);
        assert_eq!(db.events().len(), 6);
    }
}
