use std::path::PathBuf;

use thiserror::Error;

/// Every failure the crate reports.
#[derive(Debug, Error)]
pub enum SqlExecError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    YamlError(#[from] serde_yaml::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SqlExecError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SqlExecError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for SqlExecError {
    fn from(err: tokio::task::JoinError) -> Self {
        SqlExecError::ConnectionError(format!("blocking task failed: {err}"))
    }
}
