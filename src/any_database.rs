//! Backend-neutral database wrapper.

use async_trait::async_trait;

use crate::error::SqlExecError;
use crate::transaction::{Database, Transaction};

#[cfg(feature = "postgres")]
use crate::postgres::PostgresDatabase;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteDatabase;

/// One of the built-in backends, chosen at runtime (e.g. from a [`ConnectionConfig`]).
///
/// [`ConnectionConfig`]: crate::config::ConnectionConfig
#[derive(Debug)]
pub enum AnyDatabase {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteDatabase),
    #[cfg(feature = "postgres")]
    Postgres(PostgresDatabase),
}

#[async_trait]
impl Database for AnyDatabase {
    async fn begin(&mut self) -> Result<Box<dyn Transaction + '_>, SqlExecError> {
        match self {
            #[cfg(feature = "sqlite")]
            AnyDatabase::Sqlite(db) => db.begin().await,
            #[cfg(feature = "postgres")]
            AnyDatabase::Postgres(db) => db.begin().await,
            #[allow(unreachable_patterns)]
            _ => Err(SqlExecError::ConfigError(
                "This database type is not enabled in the current build".to_string(),
            )),
        }
    }
}
