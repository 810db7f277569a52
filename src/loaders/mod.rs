//! Data loaders: sources of the [`Dataset`] a watchtower checks.

mod database;

use async_trait::async_trait;
use thiserror::Error;

pub use database::{DatabaseLoader, DatabaseLoaderParams};

use crate::models::{Dataset, DatasetError};

/// A loader could not produce its dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The data source could not be reached.
    #[error("Failed to connect to data source: {0}")]
    Connection(#[source] sqlx::Error),

    /// The query was rejected or failed while running.
    #[error("Query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// The rows could not be turned into a dataset.
    #[error("Invalid dataset: {0}")]
    Dataset(#[from] DatasetError),

    /// A custom loader failed.
    #[error("Data source failure: {0}")]
    Source(String),
}

/// Produces a dataset. Loading is not retried by the pipeline.
#[async_trait]
pub trait DataLoader: Send + Sync {
    /// Loads the data.
    async fn load(&self) -> Result<Dataset, LoadError>;
}
