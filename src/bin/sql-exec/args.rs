use std::path::PathBuf;

use clap::Parser;
use sql_exec::DatabaseType;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run SQL files, directories and YAML fixtures, one transaction per input"
)]
pub(crate) struct Args {
    /// Backend used when no --config file is given.
    #[arg(long, value_enum, default_value = "sqlite")]
    pub(crate) backend: DatabaseType,
    /// SQLite database file.
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Connection settings file (YAML or JSON); overrides --backend and --database.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Inline statement, run after the paths. May be repeated.
    #[arg(long = "sql", value_name = "STMT")]
    pub(crate) sql: Vec<String>,
    /// Reject YAML rows whose columns differ from the first row.
    #[arg(long)]
    pub(crate) strict_yaml: bool,
    #[arg(long, short)]
    pub(crate) verbose: bool,
    /// `.sql` files, directories of them, or `.yml`/`.yaml` documents.
    pub(crate) paths: Vec<PathBuf>,
}
