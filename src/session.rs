use async_trait::async_trait;

use crate::error::DoltMiddlewareError;
use crate::results::ResultSet;

/// One physical connection to the engine.
///
/// Session state (selected database, checked-out branch, open transaction) lives
/// on the connection, so a `Session` is never shared between requests.
#[async_trait]
pub trait Session: Send {
    /// Run a statement that returns no rows; yields the affected row count.
    async fn execute(&mut self, sql: &str) -> Result<u64, DoltMiddlewareError>;

    /// Run a statement and materialize every row.
    async fn query(&mut self, sql: &str) -> Result<ResultSet, DoltMiddlewareError>;

    /// Round-trip reachability check.
    async fn ping(&mut self) -> Result<(), DoltMiddlewareError>;

    /// Close the connection gracefully.
    async fn close(self: Box<Self>) -> Result<(), DoltMiddlewareError>;
}

/// Opens new sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Session>, DoltMiddlewareError>;

    /// Human-readable target for logs; must not contain credentials.
    fn describe(&self) -> String;
}
