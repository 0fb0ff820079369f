use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::document::DocumentImporter;
use crate::error::SqlExecError;
use crate::record::{SqlRecord, record_to_sql};
use crate::transaction::Transaction;

use super::SqlSource;

/// Records produced by a function, one `INSERT` per record.
///
/// The function runs each time the source is asked for statements, so the records can be built
/// lazily right before the transaction that stores them.
pub struct RecordSource<F> {
    importer: F,
}

/// Build a source from a function returning the records to insert.
///
/// Records of different types can be mixed by returning `Box<dyn SqlRecord + Send>`.
pub fn source_records<F, R>(importer: F) -> RecordSource<F>
where
    F: Fn() -> Vec<R> + Send + Sync,
    R: SqlRecord,
{
    RecordSource { importer }
}

impl<F, R> RecordSource<F>
where
    F: Fn() -> Vec<R> + Send + Sync,
    R: SqlRecord,
{
    fn render(&self) -> Vec<String> {
        (self.importer)()
            .iter()
            .map(|record| record_to_sql(record))
            .collect()
    }
}

#[async_trait]
impl<F, R> SqlSource for RecordSource<F>
where
    F: Fn() -> Vec<R> + Send + Sync,
    R: SqlRecord,
{
    async fn statements(&self, _tx: &mut dyn Transaction) -> Result<Vec<String>, SqlExecError> {
        Ok(self.render())
    }

    fn describe(&self) -> String {
        "record importer".to_string()
    }
}

/// Rows from document files, one `INSERT` per table per file.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    paths: Vec<PathBuf>,
    importer: DocumentImporter,
}

/// Load rows from the given YAML (or JSON) files, in the order given.
pub fn source_yaml<I, P>(paths: I) -> DocumentSource
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    DocumentSource {
        paths: paths.into_iter().map(Into::into).collect(),
        importer: DocumentImporter::new(),
    }
}

impl DocumentSource {
    /// Reject rows whose columns differ from the first row of their table.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.importer = self.importer.strict(strict);
        self
    }
}

#[async_trait]
impl SqlSource for DocumentSource {
    async fn statements(&self, _tx: &mut dyn Transaction) -> Result<Vec<String>, SqlExecError> {
        let mut stmts = Vec::new();
        for path in &self.paths {
            let data = tokio::fs::read(path)
                .await
                .map_err(|e| SqlExecError::io(path, e))?;
            let file_stmts = self.importer.to_sql(&data).map_err(|err| match err {
                SqlExecError::Parse(msg) => {
                    SqlExecError::Parse(format!("{}: {msg}", path.display()))
                }
                other => other,
            })?;
            debug!(path = %path.display(), statements = file_stmts.len(), "read document");
            stmts.extend(file_stmts);
        }
        Ok(stmts)
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.paths.iter().map(|p| p.display().to_string()).collect();
        format!("document(s) {}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_record;

    struct DepartmentImporter {
        department_id: i64,
        name: String,
    }

    sql_record!(DepartmentImporter {
        department_id,
        name
    });

    struct Note {
        body: Option<String>,
    }

    sql_record!(Note { body });

    #[test]
    fn records_render_in_order() {
        let source = source_records(|| {
            vec![
                DepartmentImporter {
                    department_id: 1,
                    name: "Sales".into(),
                },
                DepartmentImporter {
                    department_id: 2,
                    name: "R&D".into(),
                },
            ]
        });
        assert_eq!(
            source.render(),
            vec![
                "INSERT INTO department (department_id, name) VALUES (1, 'Sales');",
                "INSERT INTO department (department_id, name) VALUES (2, 'R&D');",
            ]
        );
    }

    #[test]
    fn boxed_records_can_mix_types() {
        let source = source_records(|| {
            let records: Vec<Box<dyn SqlRecord + Send>> = vec![
                Box::new(DepartmentImporter {
                    department_id: 3,
                    name: "Ops".into(),
                }),
                Box::new(Note { body: None }),
            ];
            records
        });
        assert_eq!(
            source.render(),
            vec![
                "INSERT INTO department (department_id, name) VALUES (3, 'Ops');",
                "INSERT INTO note (body) VALUES (NULL);",
            ]
        );
    }

    #[test]
    fn empty_importer_yields_nothing() {
        let source = source_records(Vec::<Note>::new);
        assert!(source.render().is_empty());
    }
}
