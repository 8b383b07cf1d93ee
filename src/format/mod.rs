//! Rendering of result sets into the text formats handed back to callers.
//!
//! Both formats walk the declared column order of the [`ResultSet`] and check
//! every row against it position by position, so a row that lacks a declared
//! column is a [`DoltMiddlewareError::MissingColumn`] rather than a silently
//! shifted table.

mod csv;
mod markdown;

pub use csv::to_csv;
pub use markdown::to_markdown;

use crate::error::DoltMiddlewareError;
use crate::results::{ResultRow, ResultSet};
use crate::types::ResultFormat;

/// Serialize `result_set` in the requested format.
///
/// # Errors
/// Returns `MissingColumn` if a row does not carry one of the declared columns.
pub fn serialize(
    result_set: &ResultSet,
    format: ResultFormat,
) -> Result<String, DoltMiddlewareError> {
    match format {
        ResultFormat::Csv => to_csv(result_set),
        ResultFormat::Markdown => to_markdown(result_set),
    }
}

/// Display strings for one row in declared column order.
///
/// Values are taken by position so repeated column names (a join selecting
/// `a.id` and `b.id`) keep their own values. The row must carry the declared
/// name at every position.
pub(crate) fn row_fields(
    columns: &[String],
    row: &ResultRow,
) -> Result<Vec<String>, DoltMiddlewareError> {
    if row.column_names.len() > columns.len() {
        return Err(DoltMiddlewareError::ExecutionError(format!(
            "row has {} columns, result declares {}",
            row.column_names.len(),
            columns.len()
        )));
    }
    columns
        .iter()
        .enumerate()
        .map(|(idx, col)| match (row.column_names.get(idx), row.get_by_index(idx)) {
            (Some(name), Some(value)) if name == col => Ok(value.to_display_string()),
            _ => Err(DoltMiddlewareError::MissingColumn(col.clone())),
        })
        .collect()
}
