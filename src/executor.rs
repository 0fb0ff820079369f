//! Runs sources one after another, each in its own transaction.
//!
//! Every source is all-or-nothing: its statements are committed together or not at all. The
//! first failure stops the run; sources that committed before it stay committed and later
//! sources are never asked for statements.

use tracing::{debug, error, info, warn};

use crate::error::SqlExecError;
use crate::source::SqlSource;
use crate::transaction::{Database, Transaction};

/// Counts from a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecSummary {
    /// Sources committed.
    pub sources: usize,
    /// Statements executed across all sources.
    pub statements: usize,
}

/// Sequential batch runner over a [`Database`].
///
/// ```rust,no_run
/// use sql_exec::prelude::*;
///
/// # async fn demo() -> Result<(), SqlExecError> {
/// let mut db = SqliteDatabase::open_in_memory()?;
/// let summary = Executor::new(&mut db)
///     .source(source_dir("db/schema"))
///     .source(source_yaml(["db/seed.yml"]))
///     .run()
///     .await?;
/// println!("{} statements committed", summary.statements);
/// # Ok(()) }
/// ```
pub struct Executor<'db, D: Database + ?Sized> {
    db: &'db mut D,
    sources: Vec<Box<dyn SqlSource>>,
}

impl<'db, D: Database + ?Sized> Executor<'db, D> {
    pub fn new(db: &'db mut D) -> Self {
        Self {
            db,
            sources: Vec::new(),
        }
    }

    /// Append one source.
    #[must_use]
    pub fn source(mut self, source: impl SqlSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Append already boxed sources, keeping their order.
    #[must_use]
    pub fn sources(mut self, sources: impl IntoIterator<Item = Box<dyn SqlSource>>) -> Self {
        self.sources.extend(sources);
        self
    }

    /// Run every source in order.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` without touching the database when no sources were
    /// added. Otherwise returns the first error raised while beginning a transaction, producing
    /// statements, executing a statement or committing, unchanged.
    pub async fn run(self) -> Result<ExecSummary, SqlExecError> {
        if self.sources.is_empty() {
            return Err(SqlExecError::ConfigError(
                "no sources to be executed".to_string(),
            ));
        }

        info!(sources = self.sources.len(), "starting run");
        let mut summary = ExecSummary::default();
        for (index, source) in self.sources.iter().enumerate() {
            let executed = run_source(&mut *self.db, index, source.as_ref()).await?;
            summary.sources += 1;
            summary.statements += executed;
        }
        info!(
            sources = summary.sources,
            statements = summary.statements,
            "run finished"
        );
        Ok(summary)
    }
}

/// Run `sources` against `db`.
///
/// # Errors
/// See [`Executor::run`].
pub async fn exec<D>(
    db: &mut D,
    sources: impl IntoIterator<Item = Box<dyn SqlSource>>,
) -> Result<ExecSummary, SqlExecError>
where
    D: Database + ?Sized,
{
    Executor::new(db).sources(sources).run().await
}

async fn run_source<D: Database + ?Sized>(
    db: &mut D,
    index: usize,
    source: &dyn SqlSource,
) -> Result<usize, SqlExecError> {
    let name = source.describe();
    let mut tx = db.begin().await.inspect_err(|err| {
        error!(source = index, name = %name, error = %err, "could not begin transaction");
    })?;

    let stmts = match source.statements(tx.as_mut()).await {
        Ok(stmts) => stmts,
        Err(err) => {
            error!(source = index, name = %name, error = %err, "source failed");
            rollback_quietly(tx, index).await;
            return Err(err);
        }
    };

    for stmt in &stmts {
        debug!(source = index, statement = %stmt, "executing");
        if let Err(err) = tx.execute(stmt).await {
            error!(
                source = index,
                name = %name,
                statement = %stmt,
                error = %err,
                "statement failed"
            );
            rollback_quietly(tx, index).await;
            return Err(err);
        }
    }

    tx.commit().await.inspect_err(|err| {
        error!(source = index, name = %name, error = %err, "commit failed");
    })?;
    info!(source = index, name = %name, statements = stmts.len(), "source committed");
    Ok(stmts.len())
}

async fn rollback_quietly(tx: Box<dyn Transaction + '_>, index: usize) {
    if let Err(err) = tx.rollback().await {
        warn!(source = index, error = %err, "rollback failed");
    }
}
