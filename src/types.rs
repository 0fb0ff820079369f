use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde_json::Value as JsonValue;

/// A value headed for a SQL statement, or read back out of a query.
///
/// Each variant is one literal category of the encoder; see [`SqlValue::to_literal`]:
/// ```rust
/// use sql_exec::prelude::*;
///
/// let values = vec![
///     SqlValue::Int(1),
///     SqlValue::Text("O'Brien".into()),
///     SqlValue::Expr("NOW()".into()),
///     SqlValue::Null,
/// ];
/// let rendered: Vec<String> = values.iter().map(SqlValue::to_literal).collect();
/// assert_eq!(rendered, ["1", "'O''Brien'", "NOW()", "NULL"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// Absent value, rendered as `NULL`
    Null,
    /// Raw SQL expression emitted verbatim (`NOW()`, `UNIX_TIMESTAMP()`, ...)
    Expr(String),
    /// Text value
    Text(String),
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// Boolean value
    Bool(bool),
    /// JSON value
    Json(JsonValue),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let SqlValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }
}

/// The database backends the executor can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[cfg(feature = "postgres")]
    Postgres,
    /// `SQLite` database
    #[cfg(feature = "sqlite")]
    Sqlite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_int_values_read_as_int() {
        assert_eq!(SqlValue::Int(42).as_int(), Some(&42));
        assert_eq!(SqlValue::Text("42".into()).as_int(), None);
        assert_eq!(SqlValue::Null.as_int(), None);
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::Expr("NULL".into()).is_null());
    }
}
