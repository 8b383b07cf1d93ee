use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Column, ConnectOptions, Connection, Executor};

use crate::config::DoltConfig;
use crate::error::DoltMiddlewareError;
use crate::results::ResultSet;
use crate::session::{Connector, Session};

use super::query::build_result_set;

/// Opens MySQL-protocol connections to a Dolt sql-server.
#[derive(Clone, Debug)]
pub struct MySqlConnector {
    options: MySqlConnectOptions,
    parse_time: bool,
    target: String,
}

impl MySqlConnector {
    /// Build a connector from validated configuration. No connection is made.
    ///
    /// # Errors
    /// Returns configuration errors from [`DoltConfig::connect_options`].
    pub fn from_config(config: &DoltConfig) -> Result<Self, DoltMiddlewareError> {
        Ok(Self {
            options: config.connect_options()?,
            parse_time: config.parse_time,
            target: config.redacted_connection_string(),
        })
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(&self) -> Result<Box<dyn Session>, DoltMiddlewareError> {
        tracing::debug!(target = %self.target, "connecting");
        let conn = self.options.connect().await?;
        Ok(Box::new(MySqlSession {
            conn,
            parse_time: self.parse_time,
        }))
    }

    fn describe(&self) -> String {
        self.target.clone()
    }
}

/// A single MySQL-protocol connection.
///
/// Statements go through the text protocol (`sqlx::raw_sql`), which accepts
/// `CALL` and multi-statement batches without preparing them first.
pub struct MySqlSession {
    conn: MySqlConnection,
    parse_time: bool,
}

#[async_trait]
impl Session for MySqlSession {
    async fn execute(&mut self, sql: &str) -> Result<u64, DoltMiddlewareError> {
        let result = self.conn.execute(sqlx::raw_sql(sql)).await?;
        Ok(result.rows_affected())
    }

    async fn query(&mut self, sql: &str) -> Result<ResultSet, DoltMiddlewareError> {
        let rows = self.conn.fetch_all(sqlx::raw_sql(sql)).await?;
        let fallback = if rows.is_empty() {
            // Best effort; statements such as SHOW cannot always be described.
            match (&mut self.conn).describe(sql).await {
                Ok(described) => described
                    .columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect(),
                Err(_) => Vec::new(),
            }
        } else {
            Vec::new()
        };
        build_result_set(&rows, fallback, self.parse_time)
    }

    async fn ping(&mut self) -> Result<(), DoltMiddlewareError> {
        self.conn.ping().await?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DoltMiddlewareError> {
        self.conn.close().await?;
        Ok(())
    }
}
