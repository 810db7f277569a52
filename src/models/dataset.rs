//! The tabular data handed from a loader to the validators.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while building or querying a [`Dataset`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// The requested column does not exist.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A row does not have one value per column.
    #[error("Row {row} has {actual} values, expected {expected}")]
    RowWidthMismatch {
        /// Zero-based row index.
        row: usize,
        /// Number of columns.
        expected: usize,
        /// Number of values in the offending row.
        actual: usize,
    },
}

/// Rows of JSON values under named columns. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Builds a dataset, checking that every row matches the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DatasetError> {
        if let Some((row, values)) =
            rows.iter().enumerate().find(|(_, values)| values.len() != columns.len())
        {
            return Err(DatasetError::RowWidthMismatch {
                row,
                expected: columns.len(),
                actual: values.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// A dataset without columns or rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in order.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column`, if present.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Counts null entries in `column`.
    ///
    /// A dataset without rows has no nulls in any column, including columns
    /// it does not know about: a query that matched nothing carries no column
    /// metadata.
    pub fn null_count(&self, column: &str) -> Result<usize, DatasetError> {
        if self.rows.is_empty() {
            return Ok(0);
        }
        let index = self
            .column_index(column)
            .ok_or_else(|| DatasetError::ColumnNotFound(column.to_string()))?;
        Ok(self.rows.iter().filter(|row| row[index].is_null()).count())
    }
}
