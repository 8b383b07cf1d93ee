// MySQL-protocol backend for Dolt sql-server.
//
// - session: connector and per-connection session over `sqlx::MySqlConnection`
// - query: row materialization from text-protocol results

pub mod query;
pub mod session;

pub use query::build_result_set;
pub use session::{MySqlConnector, MySqlSession};
