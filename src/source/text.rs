use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::SqlExecError;
use crate::splitter::{StatementSplitter, TrailingPolicy};
use crate::transaction::Transaction;

use super::SqlSource;

const DEFAULT_EXTENSION: &str = "sql";

/// Statements given as strings, used verbatim (not split).
#[derive(Debug, Clone)]
pub struct StringSource {
    statements: Vec<String>,
}

/// The simplest source: run these strings, each as one statement.
pub fn source_string<I, S>(statements: I) -> StringSource
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    StringSource {
        statements: statements.into_iter().map(Into::into).collect(),
    }
}

#[async_trait]
impl SqlSource for StringSource {
    async fn statements(&self, _tx: &mut dyn Transaction) -> Result<Vec<String>, SqlExecError> {
        Ok(self.statements.clone())
    }

    fn describe(&self) -> String {
        format!("{} inline statement(s)", self.statements.len())
    }
}

/// Statements read from one or more files, in the order given.
#[derive(Debug, Clone)]
pub struct FileSource {
    paths: Vec<PathBuf>,
    splitter: StatementSplitter,
}

/// Load statements from the given files.
pub fn source_file<I, P>(paths: I) -> FileSource
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    FileSource {
        paths: paths.into_iter().map(Into::into).collect(),
        splitter: StatementSplitter::new(),
    }
}

impl FileSource {
    /// Choose what happens to a trailing statement without `;`.
    #[must_use]
    pub fn trailing(mut self, policy: TrailingPolicy) -> Self {
        self.splitter = self.splitter.trailing(policy);
        self
    }
}

#[async_trait]
impl SqlSource for FileSource {
    async fn statements(&self, _tx: &mut dyn Transaction) -> Result<Vec<String>, SqlExecError> {
        let mut stmts = Vec::new();
        for path in &self.paths {
            stmts.extend(read_sql_file(path, &self.splitter).await?);
        }
        Ok(stmts)
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.paths.iter().map(|p| p.display().to_string()).collect();
        format!("file(s) {}", names.join(", "))
    }
}

/// Statements from every matching file under a directory tree.
///
/// Files are visited depth first in file-name order; only files with the configured extension
/// (`sql` by default) are read.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
    extension: String,
    splitter: StatementSplitter,
}

/// Load statements from the `*.sql` files under `dir`.
pub fn source_dir(dir: impl Into<PathBuf>) -> DirSource {
    DirSource {
        dir: dir.into(),
        extension: DEFAULT_EXTENSION.to_string(),
        splitter: StatementSplitter::new(),
    }
}

impl DirSource {
    /// Only read files ending in `.{extension}`.
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Choose what happens to a trailing statement without `;`.
    #[must_use]
    pub fn trailing(mut self, policy: TrailingPolicy) -> Self {
        self.splitter = self.splitter.trailing(policy);
        self
    }
}

#[async_trait]
impl SqlSource for DirSource {
    async fn statements(&self, _tx: &mut dyn Transaction) -> Result<Vec<String>, SqlExecError> {
        let dir = self.dir.clone();
        let extension = self.extension.clone();
        let files = tokio::task::spawn_blocking(move || list_files(&dir, &extension)).await??;

        let mut stmts = Vec::new();
        for path in &files {
            stmts.extend(read_sql_file(path, &self.splitter).await?);
        }
        Ok(stmts)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}

fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, SqlExecError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            SqlExecError::io(path, err.into())
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == extension) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

async fn read_sql_file(
    path: &Path,
    splitter: &StatementSplitter,
) -> Result<Vec<String>, SqlExecError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SqlExecError::io(path, e))?;
    // invalid UTF-8 sequences become U+FFFD instead of failing the file
    let sql = String::from_utf8_lossy(&bytes);
    let stmts = splitter.split_str(&sql).map_err(|err| match err {
        SqlExecError::Parse(msg) => SqlExecError::Parse(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    debug!(path = %path.display(), statements = stmts.len(), "read SQL file");
    Ok(stmts)
}
