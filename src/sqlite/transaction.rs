use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SqlExecError;
use crate::results::ResultSet;
use crate::transaction::{Database, Transaction};

use super::config::SqliteOptions;
use super::query::build_result_set;

type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// A `SQLite` database reached through one `rusqlite` connection.
///
/// Blocking driver calls run on tokio's blocking pool so the runtime stays responsive.
pub struct SqliteDatabase {
    conn: SharedSqliteConnection,
}

impl SqliteDatabase {
    /// Open (or create) the database described by `opts`.
    ///
    /// # Errors
    /// Returns `SqlExecError::SqliteError` if the database cannot be opened or configured.
    pub async fn open(opts: &SqliteOptions) -> Result<Self, SqlExecError> {
        let path = opts.db_path.clone();
        let wal = opts.wal;
        let conn = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&path)?;
            if wal {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            Ok::<_, SqlExecError>(conn)
        })
        .await??;
        debug!(db_path = %opts.db_path, "opened SQLite database");
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `SqlExecError::SqliteError` if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, SqlExecError> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }

    /// Wrap an existing `rusqlite` connection.
    #[must_use]
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run synchronous `rusqlite` logic against the connection, outside any transaction the
    /// executor manages.
    ///
    /// # Errors
    /// Propagates the error returned by `func`, or a `ConnectionError` if the connection lock is
    /// poisoned.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlExecError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlExecError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(Arc::clone(&self.conn), func).await
    }
}

impl fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDatabase").finish_non_exhaustive()
    }
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlExecError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlExecError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn
            .lock()
            .map_err(|_| SqlExecError::ConnectionError("SQLite connection lock poisoned".into()))?;
        func(&mut guard)
    })
    .await?
}

/// Transaction handle on a [`SqliteDatabase`].
///
/// Dropping an unfinished handle rolls the transaction back.
pub struct SqliteTx {
    conn: SharedSqliteConnection,
    finished: bool,
}

impl SqliteTx {
    async fn finish(mut self: Box<Self>, sql: &'static str) -> Result<(), SqlExecError> {
        run_blocking(Arc::clone(&self.conn), move |conn| {
            conn.execute_batch(sql)?;
            Ok(())
        })
        .await?;
        self.finished = true;
        Ok(())
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn begin(&mut self) -> Result<Box<dyn Transaction + '_>, SqlExecError> {
        run_blocking(Arc::clone(&self.conn), |conn| {
            conn.execute_batch("BEGIN")?;
            Ok(())
        })
        .await?;
        Ok(Box::new(SqliteTx {
            conn: Arc::clone(&self.conn),
            finished: false,
        }))
    }
}

#[async_trait]
impl Transaction for SqliteTx {
    async fn execute(&mut self, sql: &str) -> Result<usize, SqlExecError> {
        let sql = sql.to_owned();
        run_blocking(Arc::clone(&self.conn), move |conn| {
            // execute_batch tolerates trailing comments and several statements in one string
            conn.execute_batch(&sql)?;
            Ok(usize::try_from(conn.changes()).unwrap_or(usize::MAX))
        })
        .await
    }

    async fn query(&mut self, sql: &str) -> Result<ResultSet, SqlExecError> {
        let sql = sql.to_owned();
        run_blocking(Arc::clone(&self.conn), move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            build_result_set(&mut stmt)
        })
        .await
    }

    async fn commit(self: Box<Self>) -> Result<(), SqlExecError> {
        self.finish("COMMIT").await
    }

    async fn rollback(self: Box<Self>) -> Result<(), SqlExecError> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Only reached when commit/rollback failed or the handle was abandoned.
        match self.conn.lock() {
            Ok(conn) if !conn.is_autocommit() => {
                if let Err(err) = conn.execute_batch("ROLLBACK") {
                    warn!(error = %err, "rollback of abandoned SQLite transaction failed");
                }
            }
            Ok(_) => {}
            Err(_) => warn!("SQLite connection lock poisoned; cannot roll back"),
        }
    }
}
