//! `INSERT` statements from a hierarchical document.
//!
//! The document's top level maps table names to lists of rows; each row maps column names to
//! scalars:
//!
//! ```yaml
//! employees:
//!   - id: 1
//!     name: "A"
//!   - id: 2
//!     name: "B"
//! ```
//!
//! One multi-row `INSERT` is produced per table, in document order. The first row fixes the
//! column list and later rows are emitted positionally against it. Callers must keep every row's
//! keys identical to the first row's; [`DocumentImporter::strict`] turns that into a checked
//! error instead of a silent misalignment.
//!
//! Scalars are rendered by their own rules, which differ from [`SqlValue`](crate::SqlValue):
//! string scalars (quoted, tagged `!!str`, or plain words such as `abc` or `yes`) are quoted with
//! embedded quotes doubled, numbers and booleans are emitted exactly as written in the document
//! (`1.10` stays `1.10`, `0x1F` stays `0x1F`), and a null is the lower-case `null`.

use std::collections::HashMap;
use std::str::Chars;

use yaml_rust2::parser::{Event, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::error::SqlExecError;
use crate::literal::escape_sql_string;

const CORE_SCHEMA_HANDLE: &str = "tag:yaml.org,2002:";

/// Turns documents into `INSERT` statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentImporter {
    strict: bool,
}

impl DocumentImporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require every row to have exactly the first row's columns, in the same order.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse `data` and build one statement per table.
    ///
    /// Only the first document of a multi-document stream is read.
    ///
    /// # Errors
    /// Returns `SqlExecError::Parse` if the bytes are not valid UTF-8 or YAML, or if the document
    /// does not have the table/rows/columns shape.
    pub fn to_sql(&self, data: &[u8]) -> Result<Vec<String>, SqlExecError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| SqlExecError::Parse(format!("document is not valid UTF-8: {e}")))?;
        match TreeBuilder::new(text).first_document()? {
            Some(doc) => self.node_to_sql(&doc),
            None => Ok(Vec::new()),
        }
    }

    fn node_to_sql(&self, doc: &Node) -> Result<Vec<String>, SqlExecError> {
        let tables = match doc {
            node if node.is_null() => return Ok(Vec::new()),
            Node::Mapping(tables) => tables,
            other => {
                return Err(SqlExecError::Parse(format!(
                    "document top level must map table names to rows, found {}",
                    other.kind()
                )));
            }
        };

        let mut stmts = Vec::with_capacity(tables.len());
        for (table, rows) in tables {
            let table = table.scalar_text().ok_or_else(|| {
                SqlExecError::Parse("table names must be scalars".to_string())
            })?;
            if let Some(stmt) = self.table_to_sql(table, rows)? {
                stmts.push(stmt);
            }
        }
        Ok(stmts)
    }

    fn table_to_sql(&self, table: &str, rows: &Node) -> Result<Option<String>, SqlExecError> {
        let rows = match rows {
            node if node.is_null() => return Ok(None),
            Node::Sequence(rows) if rows.is_empty() => return Ok(None),
            Node::Sequence(rows) => rows,
            other => {
                return Err(SqlExecError::Parse(format!(
                    "table {table}: expected a list of rows, found {}",
                    other.kind()
                )));
            }
        };

        let mut columns: Vec<&str> = Vec::new();
        let mut tuples = Vec::with_capacity(rows.len());

        for (idx, row) in rows.iter().enumerate() {
            let Node::Mapping(row) = row else {
                return Err(SqlExecError::Parse(format!(
                    "table {table}: row {idx} is not a mapping"
                )));
            };

            if idx == 0 {
                columns = column_names(table, row)?;
            } else if self.strict {
                let keys = column_names(table, row)?;
                if keys != columns {
                    return Err(SqlExecError::Parse(format!(
                        "table {table}: row {idx} has columns ({}) but the first row has ({})",
                        keys.join(", "),
                        columns.join(", ")
                    )));
                }
            }

            let values = row
                .iter()
                .map(|(col, val)| render_scalar(table, col, val))
                .collect::<Result<Vec<_>, _>>()?;
            tuples.push(format!("({})", values.join(", ")));
        }

        Ok(Some(format!(
            "INSERT INTO {table} ({}) VALUES {};",
            columns.join(", "),
            tuples.join(", ")
        )))
    }
}

/// Build statements from document bytes with the default (non-strict) importer.
///
/// # Errors
/// See [`DocumentImporter::to_sql`].
pub fn document_to_sql(data: &[u8]) -> Result<Vec<String>, SqlExecError> {
    DocumentImporter::new().to_sql(data)
}

/// A parsed document node. Scalars keep their source text untouched.
#[derive(Debug, Clone)]
enum Node {
    Scalar { text: String, is_str: bool },
    Sequence(Vec<Node>),
    Mapping(Vec<(Node, Node)>),
}

impl Node {
    fn is_null(&self) -> bool {
        matches!(self, Node::Scalar { text, is_str: false } if is_null_text(text))
    }

    fn scalar_text(&self) -> Option<&str> {
        match self {
            Node::Scalar { text, .. } => Some(text),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Node::Scalar { .. } => "scalar",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }
}

// Plain scalars the YAML core schema resolves to null; an empty value arrives as `~`.
fn is_null_text(text: &str) -> bool {
    matches!(text, "~" | "null" | "Null" | "NULL" | "")
}

// An untagged plain scalar is a string unless it reads as a null, bool, int or float.
fn resolves_to_str(text: &str) -> bool {
    !(is_null_text(text)
        || matches!(text, "true" | "True" | "TRUE" | "false" | "False" | "FALSE")
        || is_int_text(text)
        || is_float_text(text))
}

fn is_int_text(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (digits, radix) = if let Some(rest) = digits.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = digits.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = digits.strip_prefix("0b") {
        (rest, 2)
    } else {
        (digits, 10)
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix))
}

fn is_float_text(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    if matches!(body, ".inf" | ".Inf" | ".INF") || matches!(text, ".nan" | ".NaN" | ".NAN") {
        return true;
    }
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
            all_digits(int) && all_digits(frac) && !(int.is_empty() && frac.is_empty())
        }
        None => !mantissa.is_empty() && mantissa.chars().all(|c| c.is_ascii_digit()),
    };
    let exponent_ok = exponent.is_none_or(|exp| {
        let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
        !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
    });
    mantissa_ok && exponent_ok
}

fn is_str_tag(tag: &Tag) -> bool {
    tag.suffix == "str" && (tag.handle == CORE_SCHEMA_HANDLE || tag.handle == "!!")
}

/// Builds [`Node`] trees from parser events, resolving anchors and aliases.
struct TreeBuilder<'a> {
    parser: Parser<Chars<'a>>,
    anchors: HashMap<usize, Node>,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            parser: Parser::new(text.chars()),
            anchors: HashMap::new(),
        }
    }

    fn next_event(&mut self) -> Result<(Event, Marker), SqlExecError> {
        self.parser
            .next_token()
            .map_err(|err| SqlExecError::Parse(format!("invalid YAML: {err}")))
    }

    fn first_document(&mut self) -> Result<Option<Node>, SqlExecError> {
        loop {
            let (event, mark) = self.next_event()?;
            match event {
                Event::StreamEnd => return Ok(None),
                Event::Scalar(..)
                | Event::SequenceStart(..)
                | Event::MappingStart(..)
                | Event::Alias(_) => return self.node(event, mark).map(Some),
                _ => {}
            }
        }
    }

    fn node(&mut self, event: Event, mark: Marker) -> Result<Node, SqlExecError> {
        match event {
            Event::Scalar(text, style, anchor, tag) => {
                let is_str = match &tag {
                    Some(tag) => is_str_tag(tag),
                    None => style != TScalarStyle::Plain || resolves_to_str(&text),
                };
                Ok(self.remember(anchor, Node::Scalar { text, is_str }))
            }
            Event::SequenceStart(anchor, ..) => {
                let mut items = Vec::new();
                loop {
                    let (event, mark) = self.next_event()?;
                    if matches!(event, Event::SequenceEnd) {
                        break;
                    }
                    items.push(self.node(event, mark)?);
                }
                Ok(self.remember(anchor, Node::Sequence(items)))
            }
            Event::MappingStart(anchor, ..) => {
                let mut pairs = Vec::new();
                loop {
                    let (event, mark) = self.next_event()?;
                    if matches!(event, Event::MappingEnd) {
                        break;
                    }
                    let key = self.node(event, mark)?;
                    let (event, mark) = self.next_event()?;
                    let value = self.node(event, mark)?;
                    pairs.push((key, value));
                }
                Ok(self.remember(anchor, Node::Mapping(pairs)))
            }
            Event::Alias(id) => self.anchors.get(&id).cloned().ok_or_else(|| {
                SqlExecError::Parse(format!("line {}: unknown alias", mark.line()))
            }),
            other => Err(SqlExecError::Parse(format!(
                "line {}: unexpected YAML event {other:?}",
                mark.line()
            ))),
        }
    }

    fn remember(&mut self, anchor: usize, node: Node) -> Node {
        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        node
    }
}

fn column_names<'n>(table: &str, row: &'n [(Node, Node)]) -> Result<Vec<&'n str>, SqlExecError> {
    row.iter()
        .map(|(key, _)| {
            key.scalar_text().ok_or_else(|| {
                SqlExecError::Parse(format!("table {table}: column names must be scalars"))
            })
        })
        .collect()
}

fn render_scalar(table: &str, col: &Node, val: &Node) -> Result<String, SqlExecError> {
    match val {
        Node::Scalar { text, is_str: true } => Ok(format!("'{}'", escape_sql_string(text))),
        Node::Scalar { text, is_str: false } if is_null_text(text) => Ok("null".to_string()),
        Node::Scalar { text, is_str: false } => Ok(text.clone()),
        other => Err(SqlExecError::Parse(format!(
            "table {table}: column {} holds a {}, expected a scalar",
            col.scalar_text().unwrap_or_default(),
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPLOYEES: &str = r#"
employees:
  - employee_id: 1
    name: "田中一郎"
    age: 34
    department_id: 11

  - employee_id: 2
    name: "佐藤恵子"
    age: 28
    department_id: 1

departments:
  - department_id: 1
    name: "営業部"

  - department_id: 2
    name: "技術部"
"#;

    #[test]
    fn one_statement_per_table_in_document_order() {
        let stmts = document_to_sql(EMPLOYEES.as_bytes()).unwrap();
        assert_eq!(
            stmts,
            vec![
                "INSERT INTO employees (employee_id, name, age, department_id) VALUES (1, '田中一郎', 34, 11), (2, '佐藤恵子', 28, 1);",
                "INSERT INTO departments (department_id, name) VALUES (1, '営業部'), (2, '技術部');",
            ]
        );
    }

    #[test]
    fn simple_two_rows() {
        let doc = "employees:\n  - {id: 1, name: \"A\"}\n  - {id: 2, name: \"B\"}\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec!["INSERT INTO employees (id, name) VALUES (1, 'A'), (2, 'B');"]
        );
    }

    #[test]
    fn empty_document_yields_nothing() {
        assert!(document_to_sql(b"").unwrap().is_empty());
        assert!(document_to_sql(b"  \n").unwrap().is_empty());
        assert!(document_to_sql(b"~").unwrap().is_empty());
    }

    #[test]
    fn explicit_null_is_lower_case() {
        let doc = "employees:\n  - employee_id: 1\n    name: null\n    age: 34\n    department_id: 11\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec![
                "INSERT INTO employees (employee_id, name, age, department_id) VALUES (1, null, 34, 11);"
            ]
        );
    }

    #[test]
    fn scalar_kinds() {
        let doc = "t:\n  - a: \"it's\"\n    b: '42'\n    c: 1.5\n    d: true\n    e: ~\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec!["INSERT INTO t (a, b, c, d, e) VALUES ('it''s', '42', 1.5, true, null);"]
        );
    }

    #[test]
    fn tables_without_rows_are_skipped() {
        let doc = "empty: []\nnothing:\nt:\n  - a: 1\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec!["INSERT INTO t (a) VALUES (1);"]
        );
    }

    #[test]
    fn later_rows_follow_first_row_columns_positionally() {
        let doc = "t:\n  - a: 1\n    b: 2\n  - b: 3\n    a: 4\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec!["INSERT INTO t (a, b) VALUES (1, 2), (3, 4);"]
        );
    }

    #[test]
    fn strict_mode_rejects_mismatched_rows() {
        let doc = "t:\n  - a: 1\n    b: 2\n  - b: 3\n    a: 4\n";
        let err = DocumentImporter::new()
            .strict(true)
            .to_sql(doc.as_bytes())
            .unwrap_err();
        assert!(matches!(err, SqlExecError::Parse(msg) if msg.contains("row 1")));

        let ok = "t:\n  - a: 1\n  - a: 2\n";
        assert_eq!(
            DocumentImporter::new().strict(true).to_sql(ok.as_bytes()).unwrap(),
            vec!["INSERT INTO t (a) VALUES (1), (2);"]
        );
    }

    #[test]
    fn malformed_shapes_are_parse_errors() {
        assert!(matches!(
            document_to_sql(b"- 1\n- 2\n"),
            Err(SqlExecError::Parse(_))
        ));
        assert!(matches!(
            document_to_sql(b"t: 5\n"),
            Err(SqlExecError::Parse(_))
        ));
        assert!(matches!(
            document_to_sql(b"t:\n  - 1\n"),
            Err(SqlExecError::Parse(_))
        ));
        assert!(matches!(
            document_to_sql(b"t:\n  - a: [1, 2]\n"),
            Err(SqlExecError::Parse(_))
        ));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        assert!(matches!(
            document_to_sql(b"t: [unclosed\n"),
            Err(SqlExecError::Parse(msg)) if msg.contains("invalid YAML")
        ));
        assert!(matches!(
            document_to_sql(b"t:\n  - a: \xff\n"),
            Err(SqlExecError::Parse(msg)) if msg.contains("UTF-8")
        ));
    }

    #[test]
    fn plain_scalars_keep_their_source_text() {
        let doc = "t:\n  - big: 12345678901234567890123\n    pi: 3.14159265358979323846\n    price: 1.10\n    hex: 0x1F\n    flag: TRUE\n    word: yes\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec![
                "INSERT INTO t (big, pi, price, hex, flag, word) VALUES (12345678901234567890123, 3.14159265358979323846, 1.10, 0x1F, TRUE, 'yes');"
            ]
        );
    }

    #[test]
    fn quoted_and_str_tagged_scalars_are_text() {
        let doc = "t:\n  - a: \"1.10\"\n    b: !!str 42\n    c: 'null'\n    d: NULL\n    e:\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec!["INSERT INTO t (a, b, c, d, e) VALUES ('1.10', '42', 'null', null, null);"]
        );
    }

    #[test]
    fn anchors_and_aliases_resolve() {
        let doc = "t:\n  - &first {id: 1, name: x}\n  - *first\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec!["INSERT INTO t (id, name) VALUES (1, 'x'), (1, 'x');"]
        );
    }

    #[test]
    fn only_first_document_is_read() {
        let doc = "t:\n  - a: 1\n---\nu:\n  - b: 2\n";
        assert_eq!(
            document_to_sql(doc.as_bytes()).unwrap(),
            vec!["INSERT INTO t (a) VALUES (1);"]
        );
    }

    #[test]
    fn json_documents_parse_too() {
        let doc = br#"{"t": [{"id": 1, "name": "x"}]}"#;
        assert_eq!(
            document_to_sql(doc).unwrap(),
            vec!["INSERT INTO t (id, name) VALUES (1, 'x');"]
        );
    }
}
