use thiserror::Error;

use crate::transaction::TxState;

#[derive(Debug, Error)]
pub enum DoltMiddlewareError {
    #[error("no host defined")]
    NoHostDefined,

    #[error("no user defined")]
    NoUserDefined,

    #[error("no port defined")]
    NoPortDefined,

    #[error("no database name defined")]
    NoDatabaseNameDefined,

    #[error(transparent)]
    MySql(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("invalid {kind} name: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("row is missing expected column: {0}")]
    MissingColumn(String),

    #[error("argument {name:?} {reason}")]
    Argument { name: String, reason: String },

    #[error("expected a {expected} statement: {sql}")]
    UnexpectedStatementKind { expected: &'static str, sql: String },

    #[error("transaction already finished ({0:?})")]
    TransactionFinished(TxState),

    #[error("{0} cancelled")]
    Cancelled(&'static str),

    #[error("{0} timed out")]
    TimedOut(&'static str),
}

impl DoltMiddlewareError {
    pub(crate) fn missing_argument(name: &str) -> Self {
        Self::Argument {
            name: name.to_string(),
            reason: "is required".to_string(),
        }
    }

    pub(crate) fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        Self::Argument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// True for the validation errors raised before any connection attempt.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::NoHostDefined
                | Self::NoUserDefined
                | Self::NoPortDefined
                | Self::NoDatabaseNameDefined
                | Self::ConfigError(_)
        )
    }
}

impl From<bb8::RunError<DoltMiddlewareError>> for DoltMiddlewareError {
    fn from(err: bb8::RunError<DoltMiddlewareError>) -> Self {
        match err {
            bb8::RunError::User(inner) => inner,
            bb8::RunError::TimedOut => {
                DoltMiddlewareError::ConnectionError("timed out waiting for pooled connection".into())
            }
        }
    }
}
