//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::actions::DoltActions;
pub use crate::args::ArgMap;
pub use crate::classify::{KeywordClassifier, StatementClassifier, StatementKind};
pub use crate::config::{DoltConfig, DoltConfigBuilder};
pub use crate::context::RequestContext;
pub use crate::database::Database;
pub use crate::error::DoltMiddlewareError;
pub use crate::format::serialize;
pub use crate::results::{ResultRow, ResultSet};
pub use crate::session::{Connector, Session};
pub use crate::transaction::{
    BootstrapStep, Scope, ScopedTransaction, TxFuture, TxState, commit_or_rollback_on_error,
    with_read_only_transaction, with_transaction,
};
pub use crate::types::{ResultFormat, RowValues};
