//! `INSERT` statements from typed records.
//!
//! A record declares its own columns through [`SqlRecord`]; there is no runtime introspection.
//! [`sql_record!`](crate::sql_record) writes the impl for a struct from the list of fields that
//! should be persisted, so working fields that are left out never reach the database.

use crate::types::SqlValue;

const IMPORTER_SUFFIX: &str = "Importer";

/// A flat record that maps onto one table row.
pub trait SqlRecord {
    /// Name of the record type, e.g. `UserImporter`.
    fn type_name(&self) -> &str;

    /// Persisted fields in declaration order, paired with their values.
    fn fields(&self) -> Vec<(&'static str, SqlValue)>;

    /// Target table, derived from the type name unless overridden.
    fn table_name(&self) -> String {
        table_name_for(self.type_name())
    }
}

impl<T: SqlRecord + ?Sized> SqlRecord for Box<T> {
    fn type_name(&self) -> &str {
        (**self).type_name()
    }

    fn fields(&self) -> Vec<(&'static str, SqlValue)> {
        (**self).fields()
    }

    fn table_name(&self) -> String {
        (**self).table_name()
    }
}

/// Implement [`SqlRecord`] for a struct from the fields that should be persisted.
///
/// ```rust
/// use sql_exec::prelude::*;
/// use sql_exec::sql_record;
///
/// struct UserImporter {
///     id: i64,
///     name: String,
///     age: i32,
///     scratch: String,
/// }
///
/// sql_record!(UserImporter { id, name, age });
///
/// let user = UserImporter { id: 1, name: "test".into(), age: 20, scratch: String::new() };
/// assert_eq!(
///     record_to_sql(&user),
///     "INSERT INTO user (id, name, age) VALUES (1, 'test', 20);"
/// );
/// # let _ = user.scratch;
/// ```
#[macro_export]
macro_rules! sql_record {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::record::SqlRecord for $ty {
            fn type_name(&self) -> &str {
                stringify!($ty)
            }

            fn fields(&self) -> Vec<(&'static str, $crate::types::SqlValue)> {
                vec![$(
                    (
                        stringify!($field),
                        $crate::literal::ToSqlValue::to_sql_value(&self.$field),
                    )
                ),*]
            }
        }
    };
}

/// `UserName` becomes `user_name`: every upper-case letter after the first character starts a
/// new `_` segment, and all letters are lowered.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Table name for a record type: drop a trailing `Importer`, then snake case.
#[must_use]
pub fn table_name_for(type_name: &str) -> String {
    let name = type_name.strip_suffix(IMPORTER_SUFFIX).unwrap_or(type_name);
    to_snake_case(name)
}

/// Build the `INSERT` statement for one record.
#[must_use]
pub fn record_to_sql(record: &dyn SqlRecord) -> String {
    let fields = record.fields();
    let columns: Vec<String> = fields.iter().map(|(name, _)| to_snake_case(name)).collect();
    let values: Vec<String> = fields.iter().map(|(_, value)| value.to_literal()).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        record.table_name(),
        columns.join(", "),
        values.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::RawSql;

    #[allow(dead_code)]
    struct TestUserImporter {
        id: i64,
        name: String,
        age: i32,
        not_used_field: String,
    }

    sql_record!(TestUserImporter { id, name, age });

    #[allow(non_snake_case)]
    struct AuditLog {
        EventId: i64,
        Note: Option<String>,
        CreatedAt: RawSql,
    }

    sql_record!(AuditLog {
        EventId,
        Note,
        CreatedAt,
    });

    struct Custom;

    impl SqlRecord for Custom {
        fn type_name(&self) -> &str {
            "Custom"
        }

        fn fields(&self) -> Vec<(&'static str, SqlValue)> {
            vec![("flag", SqlValue::Int(1))]
        }

        fn table_name(&self) -> String {
            "legacy.custom_rows".to_string()
        }
    }

    #[test]
    fn snake_case_rule() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("TestUser"), "test_user");
        assert_eq!(to_snake_case("Id"), "id");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("HTTPCode"), "h_t_t_p_code");
    }

    #[test]
    fn table_name_strips_importer_suffix() {
        assert_eq!(table_name_for("UserImporter"), "user");
        assert_eq!(table_name_for("TestUserImporter"), "test_user");
        assert_eq!(table_name_for("Department"), "department");
        assert_eq!(table_name_for("Importer"), "");
    }

    #[test]
    fn record_insert_skips_unlisted_fields() {
        let user = TestUserImporter {
            id: 1,
            name: "test".into(),
            age: 20,
            not_used_field: "notUsed".into(),
        };
        let sql = record_to_sql(&user);
        assert_eq!(
            sql,
            "INSERT INTO test_user (id, name, age) VALUES (1, 'test', 20);"
        );
        assert!(!sql.contains("not_used"));
    }

    #[test]
    fn pascal_case_fields_nulls_and_expressions() {
        let log = AuditLog {
            EventId: 9,
            Note: None,
            CreatedAt: RawSql::new("NOW()"),
        };
        assert_eq!(
            record_to_sql(&log),
            "INSERT INTO audit_log (event_id, note, created_at) VALUES (9, NULL, NOW());"
        );
    }

    #[test]
    fn table_name_override() {
        assert_eq!(
            record_to_sql(&Custom),
            "INSERT INTO legacy.custom_rows (flag) VALUES (1);"
        );
    }
}
