//! A builder for creating `Dataset` instances in tests.

use serde_json::{Value, json};

use crate::models::Dataset;

/// A builder for creating `Dataset` instances in tests.
#[derive(Debug, Clone, Default)]
pub struct DatasetBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DatasetBuilder {
    /// Starts a dataset with the given column names.
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    pub fn row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }

    /// Builds the `Dataset`. Panics if a row does not match the column count.
    pub fn build(self) -> Dataset {
        Dataset::new(self.columns, self.rows).expect("test dataset rows match columns")
    }

    /// A single-column dataset with `count` rows numbered from 1.
    pub fn numbered_rows(column: &str, count: usize) -> Dataset {
        (1..=count).fold(Self::new(&[column]), |b, i| b.row(vec![json!(i)])).build()
    }
}
