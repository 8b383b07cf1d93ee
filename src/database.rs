use std::future::Future;
use std::sync::Arc;

use bb8::{ManageConnection, Pool};

use crate::config::DoltConfig;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::format::serialize;
use crate::mysql::MySqlConnector;
use crate::results::ResultSet;
use crate::session::{Connector, Session};
use crate::transaction::{BootstrapStep, Scope};
use crate::types::ResultFormat;

/// bb8 manager producing sessions from a [`Connector`].
///
/// When a database or branch is pinned, every session is positioned there when
/// it is created and again each time the pool hands it out, so a `USE` or
/// `DOLT_CHECKOUT` run through the facade does not leak into later callers.
/// With nothing pinned the session keeps whatever state the previous caller
/// left; run scoping statements through a [`ScopedTransaction`] instead.
///
/// [`ScopedTransaction`]: crate::transaction::ScopedTransaction
pub struct DoltManager {
    connector: Arc<dyn Connector>,
    pinned: Vec<String>,
}

impl DoltManager {
    /// # Errors
    /// Returns identifier errors for a malformed pinned database or branch.
    pub fn new(connector: Arc<dyn Connector>, pinned: &Scope) -> Result<Self, DoltMiddlewareError> {
        let pinned = pinned
            .steps()?
            .iter()
            .map(BootstrapStep::sql)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { connector, pinned })
    }

    async fn reposition(&self, session: &mut Box<dyn Session>) -> Result<(), DoltMiddlewareError> {
        for sql in &self.pinned {
            session.execute(sql).await?;
        }
        Ok(())
    }

    async fn open(&self) -> Result<Box<dyn Session>, DoltMiddlewareError> {
        let mut session = self.connector.connect().await?;
        if let Err(err) = self.reposition(&mut session).await {
            let _ = session.close().await;
            return Err(err);
        }
        Ok(session)
    }
}

impl ManageConnection for DoltManager {
    type Connection = Box<dyn Session>;
    type Error = DoltMiddlewareError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        async move { self.open().await }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            if self.pinned.is_empty() {
                conn.ping().await
            } else {
                self.reposition(conn).await
            }
        }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Ad-hoc query facade over a pool of sessions. Owns no transaction.
///
/// Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<DoltManager>,
    target: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Validate `config`, check reachability, and build the pool. Pooled sessions
    /// are pinned to the configured database and branch.
    ///
    /// # Errors
    /// Returns configuration errors, or the connect/ping error if the server is
    /// unreachable.
    pub async fn new(ctx: &RequestContext, config: &DoltConfig) -> Result<Self, DoltMiddlewareError> {
        config.validate()?;
        let connector = Arc::new(MySqlConnector::from_config(config)?);
        Self::with_connector_scope(ctx, connector, pinned_scope(config), config.pool_max_size).await
    }

    /// Build the facade over any connector, pinning pooled sessions to
    /// `pinned_branch` on the connection's default database.
    ///
    /// # Errors
    /// Returns `InvalidIdentifier` for a bad pinned branch, or the connect/ping
    /// error from the reachability check.
    pub async fn with_connector(
        ctx: &RequestContext,
        connector: Arc<dyn Connector>,
        pinned_branch: Option<String>,
        max_size: u32,
    ) -> Result<Self, DoltMiddlewareError> {
        let scope = match pinned_branch {
            Some(branch) => Scope::on_branch(branch),
            None => Scope::plain(),
        };
        Self::with_connector_scope(ctx, connector, scope, max_size).await
    }

    /// Build the facade over any connector, pinning pooled sessions to `pinned`.
    ///
    /// # Errors
    /// Returns identifier errors for a bad pinned scope, or the connect/ping
    /// error from the reachability check.
    pub async fn with_connector_scope(
        ctx: &RequestContext,
        connector: Arc<dyn Connector>,
        pinned: Scope,
        max_size: u32,
    ) -> Result<Self, DoltMiddlewareError> {
        let manager = DoltManager::new(Arc::clone(&connector), &pinned)?;
        let target = connector.describe();

        let mut probe = ctx.run("connect", connector.connect()).await?;
        let pinged = ctx.run("ping", probe.ping()).await;
        let _ = ctx.detached_for_cleanup().run("close", probe.close()).await;
        pinged?;

        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .test_on_check_out(true)
            .retry_connection(false)
            .build_unchecked(manager);
        tracing::info!(target = %target, pinned = ?pinned, "database pool ready");
        Ok(Self { pool, target })
    }

    /// Run a row-returning statement on a pooled session and serialize the rows.
    ///
    /// # Errors
    /// Returns pool, statement, or serializer errors.
    pub async fn query(
        &self,
        ctx: &RequestContext,
        sql: &str,
        format: ResultFormat,
    ) -> Result<String, DoltMiddlewareError> {
        let result_set = self.query_result_set(ctx, sql).await?;
        serialize(&result_set, format)
    }

    /// Run a row-returning statement and return the materialized rows.
    ///
    /// # Errors
    /// Returns pool or statement errors.
    pub async fn query_result_set(
        &self,
        ctx: &RequestContext,
        sql: &str,
    ) -> Result<ResultSet, DoltMiddlewareError> {
        let mut conn = ctx.run("acquire", async { Ok(self.pool.get().await?) }).await?;
        ctx.run("query", conn.query(sql)).await
    }

    /// Run a statement that returns no rows; yields the affected row count.
    ///
    /// # Errors
    /// Returns pool or statement errors.
    pub async fn exec(&self, ctx: &RequestContext, sql: &str) -> Result<u64, DoltMiddlewareError> {
        let mut conn = ctx.run("acquire", async { Ok(self.pool.get().await?) }).await?;
        ctx.run("exec", conn.execute(sql)).await
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Database and branch the pooled sessions are held to.
pub(crate) fn pinned_scope(config: &DoltConfig) -> Scope {
    let mut scope = Scope::plain();
    if let Some(db) = config.database() {
        scope = scope.database(db);
    }
    if let Some(branch) = config.pinned_branch() {
        scope = scope.branch(branch);
    }
    scope
}
