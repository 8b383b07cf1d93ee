//! Dolt operations exposed as callable actions.
//!
//! Every action takes a [`RequestContext`] and an [`ArgMap`] and returns the text
//! handed back to the caller. Actions that read open a scoped transaction and
//! always roll it back; actions that write finish through commit-or-rollback.
//! Server-level listings go through the pooled ad-hoc [`Database`].

mod branches;
mod commits;
mod databases;
mod diffs;
mod merges;
mod queries;
mod staging;
mod tables;

use std::sync::Arc;

use crate::args::ArgMap;
use crate::classify::{KeywordClassifier, StatementClassifier};
use crate::config::DoltConfig;
use crate::context::RequestContext;
use crate::database::{Database, pinned_scope};
use crate::error::DoltMiddlewareError;
use crate::mysql::MySqlConnector;
use crate::session::Connector;
use crate::transaction::{
    Scope, ScopedTransaction, with_read_only_transaction, with_transaction,
};
use crate::types::ResultFormat;

pub(crate) const DATABASE_ARG: &str = "database";
pub(crate) const BRANCH_ARG: &str = "branch";

/// Action handlers sharing one connector, ad-hoc pool, and classifier.
pub struct DoltActions {
    connector: Arc<dyn Connector>,
    database: Database,
    classifier: Arc<dyn StatementClassifier>,
}

impl DoltActions {
    /// Connect to the server described by `config`.
    ///
    /// # Errors
    /// Returns configuration errors or the reachability check's error.
    pub async fn connect(ctx: &RequestContext, config: &DoltConfig) -> Result<Self, DoltMiddlewareError> {
        config.validate()?;
        let connector: Arc<dyn Connector> = Arc::new(MySqlConnector::from_config(config)?);
        let database = Database::with_connector_scope(
            ctx,
            Arc::clone(&connector),
            pinned_scope(config),
            config.pool_max_size,
        )
        .await?;
        Ok(Self::new(connector, database))
    }

    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, database: Database) -> Self {
        Self {
            connector,
            database,
            classifier: Arc::new(KeywordClassifier),
        }
    }

    /// Replace the statement classifier used by [`query`](Self::query) and
    /// [`exec`](Self::exec).
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn StatementClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.database
    }

    async fn begin(
        &self,
        ctx: &RequestContext,
        scope: Scope,
    ) -> Result<ScopedTransaction, DoltMiddlewareError> {
        ScopedTransaction::begin_with(ctx, self.connector.as_ref(), scope).await
    }

    /// Run one query in a read-only scoped transaction.
    async fn read(
        &self,
        ctx: &RequestContext,
        scope: Scope,
        sql: String,
        format: ResultFormat,
    ) -> Result<String, DoltMiddlewareError> {
        let tx = self.begin(ctx, scope).await?;
        let inner = ctx.clone();
        with_read_only_transaction(ctx, tx, move |tx| {
            Box::pin(async move { tx.query(&inner, &sql, format).await })
        })
        .await
    }

    /// Run statements in order in one scoped transaction, then commit; any
    /// failure rolls the whole sequence back.
    async fn write(
        &self,
        ctx: &RequestContext,
        scope: Scope,
        statements: Vec<String>,
    ) -> Result<(), DoltMiddlewareError> {
        let tx = self.begin(ctx, scope).await?;
        let inner = ctx.clone();
        with_transaction(ctx, tx, move |tx| {
            Box::pin(async move {
                for sql in &statements {
                    tx.exec(&inner, sql).await?;
                }
                Ok(())
            })
        })
        .await
    }
}

/// `database` (required) plus `branch` (required when `branch_required`).
pub(crate) fn scope_from_args(args: &ArgMap, branch_required: bool) -> Result<Scope, DoltMiddlewareError> {
    let scope = Scope::on_database(args.require_string(DATABASE_ARG)?);
    let branch = if branch_required {
        Some(args.require_string(BRANCH_ARG)?)
    } else {
        args.optional_string(BRANCH_ARG)?
    };
    Ok(match branch {
        Some(branch) => scope.branch(branch),
        None => scope,
    })
}

/// `CALL <procedure>('a', 'b', ...);` with every argument quoted as a literal.
pub(crate) fn call_procedure(procedure: &str, args: &[&str]) -> String {
    let quoted: Vec<String> = args.iter().map(|a| crate::identifier::quote_literal(a)).collect();
    format!("CALL {procedure}({});", quoted.join(", "))
}
