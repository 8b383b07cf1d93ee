use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo};

use crate::error::DoltMiddlewareError;
use crate::results::ResultSet;
use crate::types::{RowValues, parse_timestamp};

/// Materialize text-protocol rows into a [`ResultSet`].
///
/// Column names come from the first row; `fallback_columns` is used when the
/// statement returned no rows so the header is still known. A batch yielding
/// more than one result set is rejected, since `fetch_all` concatenates their
/// rows under a single header.
///
/// # Errors
/// Returns `ExecutionError` when a row does not match the header, otherwise
/// driver errors from value extraction.
pub fn build_result_set(
    rows: &[MySqlRow],
    fallback_columns: Vec<String>,
    parse_time: bool,
) -> Result<ResultSet, DoltMiddlewareError> {
    let column_names = match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        None => fallback_columns,
    };
    let column_count = column_names.len();
    let mut result_set = ResultSet::with_capacity(column_names, rows.len());

    for row in rows {
        let row_columns: Vec<&str> = row.columns().iter().map(Column::name).collect();
        check_row_columns(result_set.column_names(), &row_columns)?;
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(mysql_extract_value(row, idx, parse_time)?);
        }
        result_set.add_row_values(values)?;
    }
    Ok(result_set)
}

/// A row belongs to the result set only if it carries the header's columns, by
/// name and position.
pub(crate) fn check_row_columns(
    header: &[String],
    row_columns: &[&str],
) -> Result<(), DoltMiddlewareError> {
    let same = header.len() == row_columns.len()
        && header.iter().zip(row_columns).all(|(h, r)| h == r);
    if same {
        Ok(())
    } else {
        Err(DoltMiddlewareError::ExecutionError(format!(
            "statement returned multiple result sets: expected columns {header:?}, got {row_columns:?}"
        )))
    }
}

/// Extract column `idx` of `row`.
///
/// Statements run over the text protocol, so every non-NULL value arrives as
/// bytes; the declared column type decides how those bytes are interpreted.
///
/// # Errors
/// Returns `MySql` if the column does not exist or cannot be read.
pub fn mysql_extract_value(
    row: &MySqlRow,
    idx: usize,
    parse_time: bool,
) -> Result<RowValues, DoltMiddlewareError> {
    let type_name = row.try_column(idx)?.type_info().name().to_ascii_uppercase();
    let raw: Option<Vec<u8>> = row.try_get_unchecked(idx)?;
    Ok(match raw {
        None => RowValues::Null,
        Some(bytes) => decode_text_value(&type_name, bytes, parse_time),
    })
}

pub(crate) fn decode_text_value(type_name: &str, bytes: Vec<u8>, parse_time: bool) -> RowValues {
    let base = type_name
        .split([' ', '('])
        .next()
        .unwrap_or(type_name);

    match base {
        "BOOLEAN" | "BOOL" => RowValues::Bool(bytes.as_slice() != b"0"),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" | "YEAR" => {
            let text = lossy(bytes);
            match text.parse::<i64>() {
                Ok(v) => RowValues::Int(v),
                Err(_) => RowValues::Text(text),
            }
        }
        "FLOAT" | "DOUBLE" => {
            let text = lossy(bytes);
            match text.parse::<f64>() {
                Ok(v) => RowValues::Float(v),
                Err(_) => RowValues::Text(text),
            }
        }
        "DATETIME" | "TIMESTAMP" if parse_time => {
            let text = lossy(bytes);
            match parse_timestamp(&text) {
                Some(ts) => RowValues::Timestamp(ts),
                None => RowValues::Text(text),
            }
        }
        "JSON" => match serde_json::from_slice(&bytes) {
            Ok(v) => RowValues::JSON(v),
            Err(_) => RowValues::Text(lossy(bytes)),
        },
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB"
        | "GEOMETRY" => RowValues::Blob(bytes),
        "BIT" => {
            let v = bytes.iter().fold(0i64, |acc, b| (acc << 8) | i64::from(*b));
            RowValues::Int(v)
        }
        _ => RowValues::Text(lossy(bytes)),
    }
}

fn lossy(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
