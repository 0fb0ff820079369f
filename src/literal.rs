//! Rendering typed values as SQL literal text.
//!
//! Statements produced by the record and document importers are plain SQL text; nothing is
//! bound as a parameter. That keeps raw expressions such as `NOW()` usable as column values, but
//! it also means this module is **not** an injection-safe encoder: the only escaping performed is
//! doubling single quotes inside text. Never pass externally controlled strings through it
//! without sanitizing them first.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone};
use serde_json::Value as JsonValue;

use crate::types::SqlValue;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Double every single quote so the text can sit inside a `'...'` literal.
#[must_use]
pub fn escape_sql_string(s: &str) -> String {
    s.replace('\'', "''")
}

impl SqlValue {
    /// Render this value as the exact literal text to embed in a statement.
    #[must_use]
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Expr(expr) => expr.clone(),
            SqlValue::Text(text) => format!("'{}'", escape_sql_string(text)),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => format!("{f:.6}"),
            SqlValue::Timestamp(ts) => format!("'{}'", ts.format(TIMESTAMP_FORMAT)),
            // no dedicated literal form: quoted textual rendering, left unescaped
            SqlValue::Bool(b) => format!("'{b}'"),
            SqlValue::Json(json) => format!("'{json}'"),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

/// Conversion from a Rust value into the literal category it is rendered with.
///
/// `Option<T>` is the nullable wrapper: `None` always becomes `NULL`. Implement this for your
/// own types to control their rendering, returning [`SqlValue::Expr`] to emit raw SQL.
pub trait ToSqlValue {
    fn to_sql_value(&self) -> SqlValue;
}

/// Encode any supported value straight to literal text.
#[must_use]
pub fn encode<T: ToSqlValue + ?Sized>(value: &T) -> String {
    value.to_sql_value().to_literal()
}

/// A raw SQL expression that is written into the statement as-is.
///
/// ```rust
/// use sql_exec::prelude::*;
///
/// assert_eq!(encode(&RawSql::new("UNIX_TIMESTAMP()")), "UNIX_TIMESTAMP()");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSql(pub String);

impl RawSql {
    #[must_use]
    pub fn new(expr: impl Into<String>) -> Self {
        RawSql(expr.into())
    }
}

impl ToSqlValue for RawSql {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Expr(self.0.clone())
    }
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(&self) -> SqlValue {
        self.clone()
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(&self) -> SqlValue {
        match self {
            Some(inner) => inner.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl<T: ToSqlValue + ?Sized> ToSqlValue for &T {
    fn to_sql_value(&self) -> SqlValue {
        (**self).to_sql_value()
    }
}

impl<T: ToSqlValue + ?Sized> ToSqlValue for Box<T> {
    fn to_sql_value(&self) -> SqlValue {
        (**self).to_sql_value()
    }
}

impl ToSqlValue for str {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.to_owned())
    }
}

impl ToSqlValue for String {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

macro_rules! impl_int {
    ($($ty:ty),*) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(&self) -> SqlValue {
                    SqlValue::Int(i64::from(*self))
                }
            }
        )*
    };
}

impl_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_wide {
    ($($ty:ty),*) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(&self) -> SqlValue {
                    // still a bare decimal when it does not fit an i64
                    i64::try_from(*self)
                        .map_or_else(|_| SqlValue::Expr(self.to_string()), SqlValue::Int)
                }
            }
        )*
    };
}

impl_wide!(isize, u64, usize);

impl ToSqlValue for f32 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(f64::from(*self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Float(*self)
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Bool(*self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Timestamp(*self)
    }
}

impl<Tz: TimeZone> ToSqlValue for DateTime<Tz> {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Timestamp(self.naive_local())
    }
}

impl ToSqlValue for JsonValue {
    fn to_sql_value(&self) -> SqlValue {
        SqlValue::Json(self.clone())
    }
}
