#![cfg(feature = "sqlite")]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sql_exec::prelude::*;
use sql_exec::sql_record;

const TESTDATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/testdata");

fn testdata(name: &str) -> String {
    format!("{TESTDATA}/{name}")
}

async fn count(db: &SqliteDatabase, sql: &str) -> i64 {
    let sql = sql.to_string();
    db.with_connection(move |conn| Ok(conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?))
        .await
        .unwrap()
}

async fn table_exists(db: &SqliteDatabase, table: &str) -> bool {
    let sql = format!("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '{table}'");
    count(db, &sql).await == 1
}

struct UserImporter {
    id: i64,
    name: String,
    age: Option<i32>,
    #[allow(dead_code)]
    password_hash: String,
}

sql_record!(UserImporter { id, name, age });

#[tokio::test]
async fn directory_file_document_and_records_run_in_order() {
    let mut db = SqliteDatabase::open_in_memory().unwrap();

    let summary = Executor::new(&mut db)
        .source(source_dir(testdata("schema")))
        .source(source_file([testdata("users.sql")]))
        .source(source_yaml([testdata("employees.yml")]))
        .source(source_records(|| {
            vec![UserImporter {
                id: 3,
                name: "Record".into(),
                age: None,
                password_hash: "x".into(),
            }]
        }))
        .run()
        .await
        .unwrap();

    // 3 CREATE TABLE + 1 index, 2 inserts, 2 multi-row inserts, 1 record
    assert_eq!(
        summary,
        ExecSummary {
            sources: 4,
            statements: 9
        }
    );
    assert_eq!(count(&db, "SELECT COUNT(*) FROM user").await, 3);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM user WHERE name = 'O''Brien'").await,
        1
    );
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM user WHERE id = 3 AND age IS NULL").await,
        1
    );
    assert_eq!(count(&db, "SELECT COUNT(*) FROM employees").await, 2);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM employees WHERE name IS NULL").await,
        1
    );
    assert_eq!(count(&db, "SELECT COUNT(*) FROM departments").await, 2);
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'idx_employees_department'"
        )
        .await,
        1
    );
}

#[tokio::test]
async fn failing_statement_rolls_back_only_its_source() {
    let mut db = SqliteDatabase::open_in_memory().unwrap();
    let later_invoked = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&later_invoked);

    let err = exec(
        &mut db,
        [
            source_string([
                "CREATE TABLE t (id INTEGER)",
                "INSERT INTO t (id) VALUES (1)",
            ])
            .boxed(),
            source_string([
                "INSERT INTO t (id) VALUES (2)",
                "INSERT INTO missing_table (id) VALUES (3)",
                "INSERT INTO t (id) VALUES (4)",
            ])
            .boxed(),
            source_fn(move |_tx| {
                flag.store(true, Ordering::SeqCst);
                Box::pin(async { Ok::<Vec<String>, SqlExecError>(Vec::new()) })
            })
            .boxed(),
        ],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SqlExecError::SqliteError(_)), "got {err:?}");
    assert_eq!(count(&db, "SELECT COUNT(*) FROM t").await, 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM t WHERE id = 2").await, 0);
    assert!(!later_invoked.load(Ordering::SeqCst));
}

#[tokio::test]
async fn custom_source_reads_through_its_transaction() {
    let mut db = SqliteDatabase::open_in_memory().unwrap();

    exec(
        &mut db,
        [
            source_string([
                "CREATE TABLE post (id INTEGER, title TEXT)",
                "INSERT INTO post VALUES (1, 'first'), (2, 'second')",
            ])
            .boxed(),
            source_fn(|tx| {
                Box::pin(async move {
                    let rows = tx.query("SELECT id FROM post ORDER BY id").await?;
                    let stmts: Vec<String> = rows
                        .results
                        .iter()
                        .filter_map(|row| row.get("id").and_then(SqlValue::as_int).copied())
                        .map(|id| {
                            format!(
                                "UPDATE post SET title = {} WHERE id = {id}",
                                encode(&format!("post #{id}"))
                            )
                        })
                        .collect();
                    Ok::<_, SqlExecError>(stmts)
                })
            })
            .named("retitle posts")
            .boxed(),
        ],
    )
    .await
    .unwrap();

    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM post WHERE title LIKE 'post #%'").await,
        2
    );
}

#[tokio::test]
async fn source_error_leaves_database_untouched() {
    let mut db = SqliteDatabase::open_in_memory().unwrap();

    let err = Executor::new(&mut db)
        .source(source_string(["CREATE TABLE kept (id INTEGER)"]))
        .source(source_file([testdata("does_not_exist.sql")]))
        .source(source_string(["CREATE TABLE never (id INTEGER)"]))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, SqlExecError::Io { .. }), "got {err:?}");
    assert!(table_exists(&db, "kept").await);
    assert!(!table_exists(&db, "never").await);
}

#[tokio::test]
async fn trailing_statement_without_semicolon() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.sql");
    std::fs::write(
        &path,
        "CREATE TABLE a (id INTEGER);\nINSERT INTO a VALUES (1)\n",
    )
    .unwrap();

    let mut db = SqliteDatabase::open_in_memory().unwrap();
    let summary = exec(&mut db, [source_file([&path]).boxed()]).await.unwrap();
    assert_eq!(summary.statements, 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM a").await, 0);

    let mut db = SqliteDatabase::open_in_memory().unwrap();
    let err = exec(
        &mut db,
        [source_file([&path]).trailing(TrailingPolicy::Error).boxed()],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SqlExecError::Parse(ref msg) if msg.contains("partial.sql")));
    assert!(!table_exists(&db, "a").await);
}

#[tokio::test]
async fn directory_extension_can_be_changed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.ddl"), "CREATE TABLE from_ddl (id INTEGER);\n").unwrap();
    std::fs::write(dir.path().join("b.sql"), "CREATE TABLE from_sql (id INTEGER);\n").unwrap();

    let mut db = SqliteDatabase::open_in_memory().unwrap();
    exec(&mut db, [source_dir(dir.path()).extension("ddl").boxed()])
        .await
        .unwrap();

    assert!(table_exists(&db, "from_ddl").await);
    assert!(!table_exists(&db, "from_sql").await);
}

#[tokio::test]
async fn no_sources_is_a_config_error() {
    let mut db = SqliteDatabase::open_in_memory().unwrap();
    let err = Executor::new(&mut db).run().await.unwrap_err();
    assert!(
        matches!(err, SqlExecError::ConfigError(ref msg) if msg == "no sources to be executed")
    );
}

#[tokio::test]
async fn config_file_opens_sqlite() {
    let config = ConnectionConfig::from_path(testdata("connection.yml"))
        .await
        .unwrap();
    assert_eq!(config.database_type(), DatabaseType::Sqlite);

    let mut db = config.connect().await.unwrap();
    let summary = exec(
        &mut db,
        [source_string(["CREATE TABLE t (id INTEGER)", "INSERT INTO t VALUES (1)"]).boxed()],
    )
    .await
    .unwrap();
    assert_eq!(summary.statements, 2);
}

#[tokio::test]
async fn file_backed_database_persists_between_connections() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db").to_string_lossy().into_owned();

    let mut db = SqliteDatabase::builder(db_path.clone())
        .wal(true)
        .build()
        .await
        .unwrap();
    exec(
        &mut db,
        [source_string(["CREATE TABLE t (id INTEGER)", "INSERT INTO t VALUES (7)"]).boxed()],
    )
    .await
    .unwrap();
    drop(db);

    let db = SqliteDatabase::open(&SqliteOptions::new(db_path)).await.unwrap();
    assert_eq!(count(&db, "SELECT COUNT(*) FROM t WHERE id = 7").await, 1);
}
