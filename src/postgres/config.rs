use serde::{Deserialize, Serialize};

use crate::error::SqlExecError;

/// Connection settings for `PostgreSQL`.
///
/// Every field is optional so the struct can be filled from partial config files;
/// [`PostgresOptions::to_pg_config`] rejects missing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl PostgresOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.dbname = Some(dbname.into());
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Validate the settings and turn them into a driver config.
    ///
    /// # Errors
    /// Returns `SqlExecError::ConfigError` naming the first missing field.
    pub fn to_pg_config(&self) -> Result<tokio_postgres::Config, SqlExecError> {
        let dbname = required(self.dbname.as_ref(), "dbname")?;
        let host = required(self.host.as_ref(), "host")?;
        let port = required(self.port.as_ref(), "port")?;
        let user = required(self.user.as_ref(), "user")?;
        let password = required(self.password.as_ref(), "password")?;

        let mut cfg = tokio_postgres::Config::new();
        cfg.dbname(dbname)
            .host(host)
            .port(*port)
            .user(user)
            .password(password);
        Ok(cfg)
    }
}

fn required<'a, T>(value: Option<&'a T>, name: &str) -> Result<&'a T, SqlExecError> {
    value.ok_or_else(|| SqlExecError::ConfigError(format!("{name} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_config_errors() {
        let opts = PostgresOptions::new().host("localhost").port(5432);
        let err = opts.to_pg_config().unwrap_err();
        assert!(matches!(err, SqlExecError::ConfigError(msg) if msg == "dbname is required"));

        let opts = opts.dbname("testing").user("testuser");
        let err = opts.to_pg_config().unwrap_err();
        assert!(matches!(err, SqlExecError::ConfigError(msg) if msg == "password is required"));
    }

    #[test]
    fn complete_options_build() {
        let cfg = PostgresOptions::new()
            .host("localhost")
            .port(5433)
            .dbname("testing")
            .user("testuser")
            .password("")
            .to_pg_config()
            .unwrap();
        assert_eq!(cfg.get_dbname(), Some("testing"));
        assert_eq!(cfg.get_ports(), &[5433]);
    }
}
