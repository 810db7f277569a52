use serde_json::Value;
use thiserror::Error;

use crate::{loaders::LoadError, plugins::PluginError, validators::ValidatorError};

/// Errors that abort a watchtower run. No run record is produced.
#[derive(Debug, Error)]
pub enum RunError {
    /// A loader or validator could not be looked up or instantiated.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// The data loader failed.
    #[error("Data loader '{loader}' failed: {source}")]
    Load {
        /// Registered loader name.
        loader: String,
        /// The underlying failure.
        #[source]
        source: LoadError,
    },

    /// A validator raised while checking the dataset.
    #[error("Validator '{validator}' failed with params {params}: {source}")]
    Validation {
        /// Registered validator name.
        validator: String,
        /// The macro-resolved params the validator ran with.
        params: Value,
        /// The underlying failure.
        #[source]
        source: ValidatorError,
    },
}
