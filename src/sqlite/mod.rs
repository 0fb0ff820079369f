// SQLite module - runs statements through a single `rusqlite` connection
//
// - config: open options and builder
// - query: result extraction
// - transaction: the `Database`/`Transaction` implementation

pub mod config;
pub mod query;
pub mod transaction;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use query::build_result_set;
pub use transaction::{SqliteDatabase, SqliteTx};
