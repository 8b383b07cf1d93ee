//! Branch- and database-scoped transactions over Dolt's MySQL interface.
//!
//! Dolt keeps the selected database and the checked-out branch as session state,
//! so a transaction that should act on branch `dev` of database `shop` must run
//! `USE` and `DOLT_CHECKOUT` on the same connection that later runs its
//! statements. [`ScopedTransaction`] owns that connection for its whole life and
//! finishes in exactly one of commit or rollback. [`Database`] is the pooled
//! facade for ad-hoc statements that need no transaction, and
//! [`DoltActions`] builds the common Dolt operations on top of both.
//!
//! Result sets render as CSV or Markdown through [`serialize`].
//!
//! ```rust,no_run
//! use dolt_middleware::prelude::*;
//!
//! # async fn example() -> Result<(), DoltMiddlewareError> {
//! let config = DoltConfig::builder("127.0.0.1", "root", 3306).finish();
//! let ctx = RequestContext::new();
//! let tx = ScopedTransaction::begin_on_database_branch(&ctx, &config, "shop", "dev").await?;
//! let inner = ctx.clone();
//! let csv = with_read_only_transaction(&ctx, tx, move |tx| {
//!     Box::pin(async move { tx.query(&inner, "SELECT * FROM orders", ResultFormat::Csv).await })
//! })
//! .await?;
//! println!("{csv}");
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod args;
pub mod classify;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod format;
pub mod identifier;
pub mod mysql;
pub mod prelude;
pub mod results;
pub mod session;
pub mod transaction;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use actions::DoltActions;
pub use config::{DoltConfig, DoltConfigBuilder};
pub use context::RequestContext;
pub use database::Database;
pub use error::DoltMiddlewareError;
pub use format::serialize;
pub use results::{ResultRow, ResultSet};
pub use transaction::{
    BootstrapStep, Scope, ScopedTransaction, TxState, commit_or_rollback_on_error,
    with_read_only_transaction, with_transaction,
};
pub use types::{ResultFormat, RowValues};
