mod args;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use sql_exec::prelude::*;
use tracing::Level;

use crate::args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    match run(args).await {
        Ok(summary) => {
            tracing::info!(
                sources = summary.sources,
                statements = summary.statements,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExecSummary, SqlExecError> {
    let config = connection_config(&args).await?;
    let sources = sources_from_args(&args);
    if sources.is_empty() {
        // nothing to run: report it without creating the database file
        return Err(SqlExecError::ConfigError(
            "no sources to be executed".to_string(),
        ));
    }
    let mut db = config.connect().await?;
    exec(&mut db, sources).await
}

async fn connection_config(args: &Args) -> Result<ConnectionConfig, SqlExecError> {
    if let Some(path) = &args.config {
        return ConnectionConfig::from_path(path).await;
    }
    match args.backend {
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => {
            let path = args.database.as_ref().ok_or_else(|| {
                SqlExecError::ConfigError("--database is required for sqlite".to_string())
            })?;
            Ok(ConnectionConfig::Sqlite(SqliteOptions::new(
                path.to_string_lossy().into_owned(),
            )))
        }
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => Err(SqlExecError::ConfigError(
            "postgres connections are configured with --config".to_string(),
        )),
    }
}

fn sources_from_args(args: &Args) -> Vec<Box<dyn SqlSource>> {
    let mut sources: Vec<Box<dyn SqlSource>> = args
        .paths
        .iter()
        .map(|path| source_for_path(path, args.strict_yaml))
        .collect();
    for stmt in &args.sql {
        sources.push(source_string([stmt.clone()]).boxed());
    }
    sources
}

fn source_for_path(path: &Path, strict_yaml: bool) -> Box<dyn SqlSource> {
    if path.is_dir() {
        return source_dir(path).boxed();
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yml" | "yaml") => source_yaml([path]).strict(strict_yaml).boxed(),
        _ => source_file([path]).boxed(),
    }
}
