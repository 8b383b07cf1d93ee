//! Connection-bound transactions positioned on a database and branch.
//!
//! A [`ScopedTransaction`] owns exactly one physical session for its whole life.
//! Database selection and branch checkout are session state in Dolt, so the
//! bootstrap statements and every caller statement must share that session; the
//! session is closed (never pooled) once the transaction ends.

mod finalize;
mod scope;

pub use finalize::{
    TxFuture, commit_or_rollback_on_error, with_read_only_transaction, with_transaction,
};
pub use scope::{BootstrapStep, Scope};

use tokio::runtime::Handle;

use crate::config::DoltConfig;
use crate::context::RequestContext;
use crate::error::DoltMiddlewareError;
use crate::format::serialize;
use crate::mysql::MySqlConnector;
use crate::results::ResultSet;
use crate::session::{Connector, Session};
use crate::types::ResultFormat;

/// Lifecycle of a scoped transaction. `Open` moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Open,
    Committed,
    RolledBack,
}

/// A transaction bound to one session, bootstrapped according to a [`Scope`].
///
/// Dropping an `Open` transaction schedules a rollback on the current tokio
/// runtime; prefer finishing through [`commit_or_rollback_on_error`] or
/// [`ScopedTransaction::rollback`].
pub struct ScopedTransaction {
    session: Option<Box<dyn Session>>,
    state: TxState,
    scope: Scope,
}

impl std::fmt::Debug for ScopedTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTransaction")
            .field("state", &self.state)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ScopedTransaction {
    /// Open a transaction with no bootstrap statements.
    ///
    /// # Errors
    /// Returns configuration, connection, or begin errors.
    pub async fn begin(
        ctx: &RequestContext,
        config: &DoltConfig,
    ) -> Result<Self, DoltMiddlewareError> {
        Self::begin_scoped(ctx, config, Scope::plain()).await
    }

    /// Open a transaction and check out `branch` on the default database.
    ///
    /// # Errors
    /// Returns configuration, connection, begin, or checkout errors.
    pub async fn begin_on_branch(
        ctx: &RequestContext,
        config: &DoltConfig,
        branch: &str,
    ) -> Result<Self, DoltMiddlewareError> {
        Self::begin_scoped(ctx, config, Scope::on_branch(branch)).await
    }

    /// Open a transaction and switch to `database`.
    ///
    /// # Errors
    /// Returns configuration, connection, begin, or use-database errors.
    pub async fn begin_on_database(
        ctx: &RequestContext,
        config: &DoltConfig,
        database: &str,
    ) -> Result<Self, DoltMiddlewareError> {
        Self::begin_scoped(ctx, config, Scope::on_database(database)).await
    }

    /// Open a transaction, switch to `database`, then check out `branch`.
    ///
    /// # Errors
    /// Returns configuration, connection, begin, use-database, or checkout errors.
    /// The checkout never runs if the use-database step fails.
    pub async fn begin_on_database_branch(
        ctx: &RequestContext,
        config: &DoltConfig,
        database: &str,
        branch: &str,
    ) -> Result<Self, DoltMiddlewareError> {
        Self::begin_scoped(ctx, config, Scope::on_database_branch(database, branch)).await
    }

    /// Open a transaction over a fresh MySQL connection built from `config`.
    ///
    /// # Errors
    /// See [`begin_with`](Self::begin_with).
    pub async fn begin_scoped(
        ctx: &RequestContext,
        config: &DoltConfig,
        scope: Scope,
    ) -> Result<Self, DoltMiddlewareError> {
        let connector = MySqlConnector::from_config(config)?;
        Self::begin_with(ctx, &connector, scope).await
    }

    /// Open a session from `connector`, begin a transaction, and run the scope's
    /// bootstrap steps in order.
    ///
    /// On any bootstrap failure the transaction is rolled back and the session
    /// closed before the triggering error is returned.
    ///
    /// # Errors
    /// Returns identifier errors (before connecting), connection or begin errors,
    /// or the first failing bootstrap statement's error.
    pub async fn begin_with(
        ctx: &RequestContext,
        connector: &dyn Connector,
        scope: Scope,
    ) -> Result<Self, DoltMiddlewareError> {
        let steps = scope.steps()?;
        let mut session = ctx.run("connect", connector.connect()).await?;

        if let Err(err) = ctx.run("begin", session.execute("START TRANSACTION")).await {
            tracing::warn!(target = %connector.describe(), error = %err, "begin failed");
            close_quietly(ctx, session).await;
            return Err(err);
        }

        let mut tx = Self {
            session: Some(session),
            state: TxState::Open,
            scope,
        };

        for step in steps {
            let sql = step.sql()?;
            tracing::debug!(statement = %sql, "bootstrap");
            if let Err(err) = tx.exec_in("bootstrap", ctx, &sql).await {
                tracing::debug!(error = %err, statement = %sql, "bootstrap failed, rolling back");
                if let Err(rb) = tx.rollback(ctx).await {
                    tracing::warn!(error = %rb, "rollback after bootstrap failure failed");
                }
                return Err(err);
            }
        }
        Ok(tx)
    }

    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == TxState::Open
    }

    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Run a statement that returns no rows.
    ///
    /// # Errors
    /// Returns `TransactionFinished` if the transaction has ended, or the
    /// statement's error.
    pub async fn exec(&mut self, ctx: &RequestContext, sql: &str) -> Result<u64, DoltMiddlewareError> {
        self.exec_in("exec", ctx, sql).await
    }

    /// Run a query and return the materialized rows.
    ///
    /// # Errors
    /// Returns `TransactionFinished` if the transaction has ended, or the
    /// statement's error.
    pub async fn query_result_set(
        &mut self,
        ctx: &RequestContext,
        sql: &str,
    ) -> Result<ResultSet, DoltMiddlewareError> {
        let session = self.session_mut()?;
        ctx.run("query", session.query(sql)).await
    }

    /// Run a query and serialize the rows.
    ///
    /// # Errors
    /// Returns statement errors or `MissingColumn` from the serializer.
    pub async fn query(
        &mut self,
        ctx: &RequestContext,
        sql: &str,
        format: ResultFormat,
    ) -> Result<String, DoltMiddlewareError> {
        let result_set = self.query_result_set(ctx, sql).await?;
        serialize(&result_set, format)
    }

    /// Commit and close the session.
    ///
    /// A failed commit is followed by a best-effort rollback; the transaction
    /// ends `RolledBack` and the commit error is returned.
    ///
    /// # Errors
    /// Returns `TransactionFinished` if already terminated, or the commit error.
    pub async fn commit(&mut self, ctx: &RequestContext) -> Result<(), DoltMiddlewareError> {
        let session = self.session_mut()?;
        match ctx.run("commit", session.execute("COMMIT")).await {
            Ok(_) => {
                self.state = TxState::Committed;
                tracing::debug!(scope = ?self.scope, "committed");
                self.close_session(ctx).await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(scope = ?self.scope, error = %err, "commit failed, rolling back");
                if let Err(rb) = self.rollback(ctx).await {
                    tracing::warn!(error = %rb, "rollback after failed commit failed");
                }
                Err(err)
            }
        }
    }

    /// Roll back and close the session. A no-op on a terminated transaction.
    ///
    /// Runs even if `ctx` is cancelled (bounded by the cleanup timeout); the
    /// transaction is `RolledBack` afterwards whether or not the statement
    /// succeeded, since closing the session discards uncommitted work.
    ///
    /// # Errors
    /// Returns the rollback statement's error.
    pub async fn rollback(&mut self, ctx: &RequestContext) -> Result<(), DoltMiddlewareError> {
        if self.state != TxState::Open {
            return Ok(());
        }
        let cleanup = ctx.detached_for_cleanup();
        let result = match self.session.as_mut() {
            Some(session) => cleanup
                .run("rollback", session.execute("ROLLBACK"))
                .await
                .map(|_| ()),
            None => Ok(()),
        };
        self.state = TxState::RolledBack;
        tracing::debug!(scope = ?self.scope, ok = result.is_ok(), "rolled back");
        self.close_session(ctx).await;
        result
    }

    async fn exec_in(
        &mut self,
        op: &'static str,
        ctx: &RequestContext,
        sql: &str,
    ) -> Result<u64, DoltMiddlewareError> {
        let session = self.session_mut()?;
        ctx.run(op, session.execute(sql)).await
    }

    fn session_mut(&mut self) -> Result<&mut Box<dyn Session>, DoltMiddlewareError> {
        if self.state != TxState::Open {
            return Err(DoltMiddlewareError::TransactionFinished(self.state));
        }
        self.session.as_mut().ok_or_else(|| {
            DoltMiddlewareError::ExecutionError("transaction session already taken".into())
        })
    }

    async fn close_session(&mut self, ctx: &RequestContext) {
        if let Some(session) = self.session.take() {
            close_quietly(ctx, session).await;
        }
    }
}

async fn close_quietly(ctx: &RequestContext, session: Box<dyn Session>) {
    let cleanup = ctx.detached_for_cleanup();
    if let Err(err) = cleanup.run("close", session.close()).await {
        tracing::debug!(error = %err, "closing session failed");
    }
}

impl Drop for ScopedTransaction {
    fn drop(&mut self) {
        if self.state != TxState::Open {
            return;
        }
        self.state = TxState::RolledBack;
        let Some(mut session) = self.session.take() else {
            return;
        };
        tracing::warn!(scope = ?self.scope, "open transaction dropped, rolling back");
        if let Ok(handle) = Handle::try_current() {
            handle.spawn(async move {
                let cleanup = RequestContext::new().detached_for_cleanup();
                if let Err(err) = cleanup.run("rollback", session.execute("ROLLBACK")).await {
                    tracing::warn!(error = %err, "rollback of dropped transaction failed");
                }
                let _ = cleanup.run("close", session.close()).await;
            });
        }
    }
}
