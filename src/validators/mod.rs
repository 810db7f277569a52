//! Validators: checks run against a loaded [`Dataset`].

mod not_null;
mod row_count;

use thiserror::Error;

pub use not_null::{ExpectColumnValuesToNotBeNull, NotNullParams};
pub use row_count::{ExpectRowCountToBeBetween, RowCountParams};

use crate::models::{Dataset, DatasetError, Params};

/// The result of a single check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// Whether the dataset passed.
    pub success: bool,
    /// Measurements taken while checking.
    pub metrics: Params,
}

/// A validator could not evaluate the dataset.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// The dataset does not have the shape the validator needs.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Any other failure raised by a validator implementation.
    #[error("{0}")]
    Failed(String),
}

/// A check over a dataset. Implementations depend only on their own
/// parameters and must not modify the dataset.
pub trait Validator: Send + Sync {
    /// Evaluates the dataset.
    fn validate(&self, data: &Dataset) -> Result<ValidationOutcome, ValidatorError>;
}
