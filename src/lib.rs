//! Run batches of SQL statements, each batch in its own transaction.
//!
//! A batch comes from a [`SqlSource`]: inline strings, `.sql` files or directories, typed
//! records, YAML documents, or custom async logic that may read through the open transaction
//! first. The [`Executor`] runs sources in order and stops at the first failure, rolling back
//! only the batch that failed.
//!
//! ```rust,no_run
//! use sql_exec::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlExecError> {
//! let mut db = SqliteDatabase::open_in_memory()?;
//! exec(
//!     &mut db,
//!     [
//!         source_string(["CREATE TABLE user (id INTEGER, name TEXT)"]).boxed(),
//!         source_string(["INSERT INTO user VALUES (1, 'a')"]).boxed(),
//!     ],
//! )
//! .await?;
//! # Ok(()) }
//! ```

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one backend feature: `sqlite` or `postgres`");

pub mod prelude;

pub mod any_database;
pub mod config;
pub mod document;
pub mod error;
pub mod executor;
pub mod literal;
pub mod record;
pub mod results;
pub mod source;
pub mod splitter;
pub mod transaction;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use any_database::AnyDatabase;
pub use config::ConnectionConfig;
pub use document::{DocumentImporter, document_to_sql};
pub use error::SqlExecError;
pub use executor::{ExecSummary, Executor, exec};
pub use literal::{RawSql, ToSqlValue, encode};
pub use record::{SqlRecord, record_to_sql};
pub use results::{CustomDbRow, ResultSet};
pub use source::SqlSource;
pub use splitter::{StatementSplitter, TrailingPolicy, split_statements, split_str};
pub use transaction::{Database, Transaction};
pub use types::{DatabaseType, SqlValue};
