use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DoltMiddlewareError;
use crate::types::RowValues;

use super::row::{ResultRow, index_columns};

/// The rows returned by a query plus their declared column order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<ResultRow>,
    /// The number of rows affected (for DML statements) or returned (for queries)
    pub rows_affected: usize,
    column_names: Arc<Vec<String>>,
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Empty result set with the given column order.
    #[must_use]
    pub fn new(column_names: Vec<String>) -> Self {
        Self::with_capacity(column_names, 0)
    }

    #[must_use]
    pub fn with_capacity(column_names: Vec<String>, capacity: usize) -> Self {
        let cache = Arc::new(index_columns(&column_names));
        Self {
            results: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: Arc::new(column_names),
            column_index_cache: cache,
        }
    }

    /// Build a result set from positional rows.
    ///
    /// # Errors
    /// Returns `ExecutionError` if any row's width differs from the column count.
    pub fn from_rows(
        column_names: Vec<String>,
        rows: Vec<Vec<RowValues>>,
    ) -> Result<Self, DoltMiddlewareError> {
        let mut result_set = Self::with_capacity(column_names, rows.len());
        for row in rows {
            result_set.add_row_values(row)?;
        }
        Ok(result_set)
    }

    #[must_use]
    pub fn column_names(&self) -> &Arc<Vec<String>> {
        &self.column_names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Append a row whose values follow the declared column order.
    ///
    /// # Errors
    /// Returns `ExecutionError` if the row width differs from the column count.
    pub fn add_row_values(&mut self, values: Vec<RowValues>) -> Result<(), DoltMiddlewareError> {
        if values.len() != self.column_names.len() {
            return Err(DoltMiddlewareError::ExecutionError(format!(
                "row has {} values for {} columns",
                values.len(),
                self.column_names.len()
            )));
        }
        self.results.push(ResultRow {
            column_names: Arc::clone(&self.column_names),
            values,
            column_index_cache: Arc::clone(&self.column_index_cache),
        });
        self.rows_affected += 1;
        Ok(())
    }

    /// Append a row built elsewhere. Its own column names are kept as-is, so the
    /// serializer checks every declared column against it.
    pub fn add_row(&mut self, row: ResultRow) {
        self.results.push(row);
        self.rows_affected += 1;
    }
}
