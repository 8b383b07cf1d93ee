//! Typed accessors over the loosely-typed argument maps actions receive.

use serde_json::{Map, Value};

use crate::error::DoltMiddlewareError;
use crate::types::ResultFormat;

/// Argument name selecting the output format of listing actions.
pub const RESULT_FORMAT_ARG: &str = "result_format";

/// A name-to-value argument map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgMap {
    values: Map<String, Value>,
}

impl ArgMap {
    #[must_use]
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// Wrap a JSON value, which must be an object (or null for "no arguments").
    ///
    /// # Errors
    /// Returns an argument error for any other JSON type.
    pub fn from_value(value: Value) -> Result<Self, DoltMiddlewareError> {
        match value {
            Value::Object(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            other => Err(DoltMiddlewareError::invalid_argument(
                "arguments",
                format!("must be an object, got {other}"),
            )),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    /// A present, non-empty string.
    ///
    /// # Errors
    /// Returns an argument error if missing, null, empty, or not a string.
    pub fn require_string(&self, name: &str) -> Result<String, DoltMiddlewareError> {
        self.optional_string(name)?
            .ok_or_else(|| DoltMiddlewareError::missing_argument(name))
    }

    /// A string if present and non-empty.
    ///
    /// # Errors
    /// Returns an argument error if present with a non-string type.
    pub fn optional_string(&self, name: &str) -> Result<Option<String>, DoltMiddlewareError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(DoltMiddlewareError::invalid_argument(
                name,
                format!("must be a string, got {other}"),
            )),
        }
    }

    /// A boolean, defaulting to `false` when absent.
    ///
    /// # Errors
    /// Returns an argument error if present with a non-boolean type.
    pub fn optional_bool(&self, name: &str) -> Result<bool, DoltMiddlewareError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(DoltMiddlewareError::invalid_argument(
                name,
                format!("must be a boolean, got {other}"),
            )),
        }
    }

    /// A number if present.
    ///
    /// # Errors
    /// Returns an argument error if present with a non-numeric type.
    pub fn optional_number(&self, name: &str) -> Result<Option<f64>, DoltMiddlewareError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| {
                DoltMiddlewareError::invalid_argument(name, "is not representable as f64")
            }),
            Some(other) => Err(DoltMiddlewareError::invalid_argument(
                name,
                format!("must be a number, got {other}"),
            )),
        }
    }

    /// The requested output format, Markdown when absent.
    ///
    /// # Errors
    /// Returns an argument error for an unknown format name.
    pub fn result_format(&self) -> Result<ResultFormat, DoltMiddlewareError> {
        match self.optional_string(RESULT_FORMAT_ARG)? {
            Some(name) => name.parse(),
            None => Ok(ResultFormat::default()),
        }
    }
}

impl From<Map<String, Value>> for ArgMap {
    fn from(values: Map<String, Value>) -> Self {
        Self::new(values)
    }
}
