// PostgreSQL module - runs statements through a single `tokio-postgres` client
//
// - config: connection options and validation
// - query: result extraction
// - transaction: the `Database`/`Transaction` implementation

pub mod config;
pub mod query;
pub mod transaction;

pub use config::PostgresOptions;
pub use query::build_result_set_from_rows;
pub use transaction::{PostgresDatabase, PostgresTx};
