//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::any_database::AnyDatabase;
pub use crate::config::ConnectionConfig;
pub use crate::document::{DocumentImporter, document_to_sql};
pub use crate::error::SqlExecError;
pub use crate::executor::{ExecSummary, Executor, exec};
pub use crate::literal::{RawSql, ToSqlValue, encode};
pub use crate::record::{SqlRecord, record_to_sql};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::source::{
    DirSource, DocumentSource, FileSource, FnSource, RecordSource, SourceFuture, SqlSource,
    StringSource, source_dir, source_file, source_fn, source_records, source_string, source_yaml,
};
pub use crate::splitter::{StatementSplitter, TrailingPolicy, split_str};
pub use crate::transaction::{Database, Transaction};
pub use crate::types::{DatabaseType, SqlValue};

#[cfg(feature = "postgres")]
pub use crate::postgres::{PostgresDatabase, PostgresOptions};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDatabase, SqliteOptions, SqliteOptionsBuilder};
