use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::DoltMiddlewareError;

/// Format used when rendering timestamps back to text.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A dynamically-typed scalar materialized from a result row.
///
/// ```rust
/// use dolt_middleware::prelude::*;
///
/// let row = vec![
///     RowValues::Int(1),
///     RowValues::Text("main".into()),
///     RowValues::Null,
/// ];
/// assert_eq!(row[2].to_display_string(), "");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Date/time value, only produced when `parse_time` is enabled
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Raw bytes from a binary column
    Blob(Vec<u8>),
}

impl RowValues {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RowValues::Bool(value) => Some(*value),
            RowValues::Int(1) => Some(true),
            RowValues::Int(0) => Some(false),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            RowValues::Timestamp(value) => Some(*value),
            RowValues::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Text form used by every result format. NULL renders as the empty string and
    /// binary payloads are decoded as (lossy) UTF-8.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            RowValues::Int(v) => v.to_string(),
            RowValues::Float(v) => v.to_string(),
            RowValues::Text(v) => v.clone(),
            RowValues::Bool(v) => v.to_string(),
            RowValues::Timestamp(v) => v.format(TIMESTAMP_FORMAT).to_string(),
            RowValues::Null => String::new(),
            RowValues::JSON(v) => v.to_string(),
            RowValues::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl fmt::Display for RowValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Text encoding for a serialized result set.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    Csv,
    #[default]
    Markdown,
}

impl FromStr for ResultFormat {
    type Err = DoltMiddlewareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ResultFormat::Csv),
            "markdown" | "md" => Ok(ResultFormat::Markdown),
            other => Err(DoltMiddlewareError::invalid_argument(
                "result_format",
                format!("must be one of csv, markdown (got {other:?})"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strings() {
        assert_eq!(RowValues::Null.to_display_string(), "");
        assert_eq!(RowValues::Bool(true).to_display_string(), "true");
        assert_eq!(RowValues::Float(1.5).to_display_string(), "1.5");
        assert_eq!(
            RowValues::Blob(b"hello".to_vec()).to_display_string(),
            "hello"
        );
        assert_eq!(
            RowValues::JSON(serde_json::json!({"a": 1})).to_display_string(),
            r#"{"a":1}"#
        );
    }

    #[test]
    fn timestamp_renders_like_server_text() {
        let ts = parse_timestamp("2024-03-01 12:30:05").expect("parse");
        assert_eq!(
            RowValues::Timestamp(ts).to_display_string(),
            "2024-03-01 12:30:05"
        );
        let ts = parse_timestamp("2024-03-01 12:30:05.250").expect("parse fractional");
        assert_eq!(
            RowValues::Timestamp(ts).to_display_string(),
            "2024-03-01 12:30:05.250"
        );
    }

    #[test]
    fn result_format_parses_names() {
        assert_eq!("CSV".parse::<ResultFormat>().unwrap(), ResultFormat::Csv);
        assert_eq!("md".parse::<ResultFormat>().unwrap(), ResultFormat::Markdown);
        assert!("json".parse::<ResultFormat>().is_err());
        assert_eq!(ResultFormat::default(), ResultFormat::Markdown);
    }
}
