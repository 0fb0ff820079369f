//! The seam between the executor and a database driver.

use async_trait::async_trait;

use crate::error::SqlExecError;
use crate::results::ResultSet;

/// An open transaction.
///
/// Statement text is sent as-is; there is no parameter binding at this boundary. The executor
/// owns the handle and is the only party that commits or rolls it back: sources only ever see
/// `&mut dyn Transaction`, and the finishing methods take the boxed handle by value.
#[async_trait]
pub trait Transaction: Send {
    /// Execute one statement, returning the number of affected rows when the driver reports it.
    ///
    /// # Errors
    /// Returns the driver's error if the statement fails.
    async fn execute(&mut self, sql: &str) -> Result<usize, SqlExecError>;

    /// Run a query and collect its rows.
    ///
    /// # Errors
    /// Returns the driver's error if the query fails or a value cannot be read.
    async fn query(&mut self, sql: &str) -> Result<ResultSet, SqlExecError>;

    /// Commit the transaction.
    ///
    /// # Errors
    /// Returns the driver's error if the commit fails.
    async fn commit(self: Box<Self>) -> Result<(), SqlExecError>;

    /// Roll back the transaction.
    ///
    /// # Errors
    /// Returns the driver's error if the rollback fails.
    async fn rollback(self: Box<Self>) -> Result<(), SqlExecError>;
}

/// Something that can open transactions.
#[async_trait]
pub trait Database: Send {
    /// Begin a new transaction. The handle borrows the database until it is finished.
    ///
    /// # Errors
    /// Returns the driver's error if the transaction cannot be started.
    async fn begin(&mut self) -> Result<Box<dyn Transaction + '_>, SqlExecError>;
}
