//! This module contains the error types for the persistence layer.

use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A general error occurred during a data store operation.
    #[error("A data store operation failed: {0}")]
    OperationFailed(String),

    /// The requested item was not found in the data store.
    #[error("The requested item was not found: {0}")]
    NotFound(String),

    /// A stored JSON column could not be encoded or decoded.
    #[error("Failed to serialize or deserialize data: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// An error occurred during a database migration.
    #[error("A data migration failed: {0}")]
    MigrationError(String),

    /// An invalid database URL or stored value.
    #[error("An invalid configuration or input was provided: {0}")]
    InvalidInput(String),

    /// A watchtower with the same name is already stored.
    #[error("Watchtower already exists: {0}")]
    AlreadyExists(String),
}
