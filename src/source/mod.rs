//! Producers of SQL statements.
//!
//! A [`SqlSource`] is asked once, inside the transaction the executor opened for it, for the
//! statements it wants run. Most sources ignore the transaction; [`source_fn`] exposes it so a
//! batch can read current data before deciding what to write.

mod importer;
mod text;

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::SqlExecError;
use crate::transaction::Transaction;

pub use importer::{DocumentSource, RecordSource, source_records, source_yaml};
pub use text::{DirSource, FileSource, StringSource, source_dir, source_file, source_string};

/// Produces the ordered statements for one all-or-nothing batch.
#[async_trait]
pub trait SqlSource: Send + Sync {
    /// Return the statements to run inside `tx`, in order.
    ///
    /// The transaction belongs to the executor: a source may read through it but must not keep
    /// it past this call.
    ///
    /// # Errors
    /// Any error aborts the run; the executor rolls `tx` back before returning it.
    async fn statements(&self, tx: &mut dyn Transaction) -> Result<Vec<String>, SqlExecError>;

    /// Short label used in logs.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    /// Box this source for a heterogeneous source list.
    fn boxed(self) -> Box<dyn SqlSource>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// Future returned by the closure behind [`source_fn`].
pub type SourceFuture<'t> =
    Pin<Box<dyn Future<Output = Result<Vec<String>, SqlExecError>> + Send + 't>>;

/// A source backed by arbitrary async logic with access to the transaction.
pub struct FnSource<F> {
    func: F,
    name: String,
}

/// Wrap a closure as a source.
///
/// ```rust,no_run
/// use sql_exec::prelude::*;
///
/// let touch_posts = source_fn(|tx| {
///     Box::pin(async move {
///         let rows = tx.query("SELECT id FROM post ORDER BY id").await?;
///         let stmts: Vec<String> = rows
///             .results
///             .iter()
///             .filter_map(|row| row.get("id").and_then(SqlValue::as_int).copied())
///             .map(|id| format!("UPDATE post SET title = 'updated' WHERE id = {id}"))
///             .collect();
///         Ok::<_, SqlExecError>(stmts)
///     })
/// });
/// # let _ = touch_posts;
/// ```
pub fn source_fn<F>(func: F) -> FnSource<F>
where
    F: for<'t> Fn(&'t mut dyn Transaction) -> SourceFuture<'t> + Send + Sync,
{
    FnSource {
        func,
        name: "custom source".to_string(),
    }
}

impl<F> FnSource<F> {
    /// Label the source in logs.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl<F> SqlSource for FnSource<F>
where
    F: for<'t> Fn(&'t mut dyn Transaction) -> SourceFuture<'t> + Send + Sync,
{
    async fn statements(&self, tx: &mut dyn Transaction) -> Result<Vec<String>, SqlExecError> {
        (self.func)(tx).await
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
