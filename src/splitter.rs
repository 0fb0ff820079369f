//! Lexical splitting of SQL text into statements.
//!
//! The scan is line based and knows nothing about SQL grammar: a line starting with `-- ` is a
//! pure comment and is dropped, every other line is kept verbatim, and a statement ends on the
//! first line whose last whitespace-separated token (ignoring a trailing `--` comment) ends with
//! `;`. Semicolons inside string literals or block comments are not special.

use std::io::BufRead;

use tracing::warn;

use crate::error::SqlExecError;

const COMMENT_MARKER: &str = "--";
const COMMENT_LINE_PREFIX: &str = "-- ";

/// What to do with text left over after the last `;`-terminated line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingPolicy {
    /// Drop it, logging a warning.
    #[default]
    Discard,
    /// Fail with [`SqlExecError::Parse`].
    Error,
}

/// Splits SQL text into statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementSplitter {
    trailing: TrailingPolicy,
}

impl StatementSplitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn trailing(mut self, policy: TrailingPolicy) -> Self {
        self.trailing = policy;
        self
    }

    /// Split everything readable from `reader`.
    ///
    /// Each statement keeps its original lines, each followed by `\n`.
    ///
    /// # Errors
    /// Returns `SqlExecError::Io` if reading fails, or `SqlExecError::Parse` when the input ends
    /// with an unterminated statement and the policy is [`TrailingPolicy::Error`].
    pub fn split<R: BufRead>(&self, reader: R) -> Result<Vec<String>, SqlExecError> {
        let mut acc = Accumulator::default();
        for line in reader.lines() {
            let line = line.map_err(|e| SqlExecError::io("<sql input>", e))?;
            acc.push_line(&line);
        }
        acc.finish(self.trailing)
    }

    /// Split an in-memory string.
    ///
    /// # Errors
    /// Only fails under [`TrailingPolicy::Error`]; see [`StatementSplitter::split`].
    pub fn split_str(&self, sql: &str) -> Result<Vec<String>, SqlExecError> {
        self.split(sql.as_bytes())
    }
}

/// Split with the default policy (trailing text is dropped).
///
/// # Errors
/// Returns `SqlExecError::Io` if reading from `reader` fails.
pub fn split_statements<R: BufRead>(reader: R) -> Result<Vec<String>, SqlExecError> {
    StatementSplitter::new().split(reader)
}

/// Split a string with the default policy.
#[must_use]
pub fn split_str(sql: &str) -> Vec<String> {
    let mut acc = Accumulator::default();
    for line in sql.lines() {
        acc.push_line(line);
    }
    acc.discard_tail()
}

#[derive(Default)]
struct Accumulator {
    stmts: Vec<String>,
    buf: String,
}

impl Accumulator {
    fn push_line(&mut self, line: &str) {
        if line.starts_with(COMMENT_LINE_PREFIX) {
            return;
        }

        self.buf.push_str(line);
        self.buf.push('\n');

        if ends_statement(line) {
            self.stmts.push(std::mem::take(&mut self.buf));
        }
    }

    fn finish(self, policy: TrailingPolicy) -> Result<Vec<String>, SqlExecError> {
        match policy {
            TrailingPolicy::Discard => Ok(self.discard_tail()),
            TrailingPolicy::Error if !self.buf.trim().is_empty() => Err(SqlExecError::Parse(
                format!(
                    "statement is missing its terminating semicolon: {}",
                    self.buf.trim()
                ),
            )),
            TrailingPolicy::Error => Ok(self.stmts),
        }
    }

    fn discard_tail(self) -> Vec<String> {
        let tail = self.buf.trim();
        if !tail.is_empty() {
            warn!(trailing = %tail, "discarding SQL without a terminating semicolon");
        }
        self.stmts
    }
}

// The last token before any `--` token decides.
fn ends_statement(line: &str) -> bool {
    line.split_whitespace()
        .take_while(|word| !word.starts_with(COMMENT_MARKER))
        .last()
        .is_some_and(|word| word.ends_with(';'))
}
