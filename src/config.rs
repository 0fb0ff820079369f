//! Which database to run against, loadable from a YAML or JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::any_database::AnyDatabase;
use crate::error::SqlExecError;
use crate::types::DatabaseType;

#[cfg(feature = "postgres")]
use crate::postgres::{PostgresDatabase, PostgresOptions};
#[cfg(feature = "sqlite")]
use crate::sqlite::{SqliteDatabase, SqliteOptions};

/// Connection settings for one backend.
///
/// ```yaml
/// backend: postgres
/// host: localhost
/// port: 5432
/// dbname: app
/// user: app
/// password: secret
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum ConnectionConfig {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteOptions),
    #[cfg(feature = "postgres")]
    Postgres(PostgresOptions),
}

impl ConnectionConfig {
    /// Read a config file.
    ///
    /// # Errors
    /// Returns `SqlExecError::Io` if the file cannot be read or `SqlExecError::YamlError` if it
    /// does not describe a known backend.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, SqlExecError> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| SqlExecError::io(path, e))?;
        Ok(serde_yaml::from_slice(&raw)?)
    }

    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectionConfig::Sqlite(_) => DatabaseType::Sqlite,
            #[cfg(feature = "postgres")]
            ConnectionConfig::Postgres(_) => DatabaseType::Postgres,
        }
    }

    /// Open the configured database.
    ///
    /// # Errors
    /// Returns `SqlExecError` if the settings are incomplete or the connection fails.
    pub async fn connect(&self) -> Result<AnyDatabase, SqlExecError> {
        match self {
            #[cfg(feature = "sqlite")]
            ConnectionConfig::Sqlite(opts) => {
                Ok(AnyDatabase::Sqlite(SqliteDatabase::open(opts).await?))
            }
            #[cfg(feature = "postgres")]
            ConnectionConfig::Postgres(opts) => {
                Ok(AnyDatabase::Postgres(PostgresDatabase::connect(opts).await?))
            }
        }
    }
}
