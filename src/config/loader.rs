//! Loads watchtower definitions from a YAML file.

use std::{collections::HashSet, fs, path::PathBuf};

use config::{Config, File, FileFormat};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{error::ConfigurationError, macros::is_valid_macro_name, models::WatchtowerConfig};

/// A generic loader for YAML files.
pub struct ConfigLoader {
    path: PathBuf,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file could not be read.
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file is not valid YAML or does not match the expected shape.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// The file extension is not `.yaml` / `.yml`.
    #[error("Unsupported configuration format")]
    UnsupportedFormat,

    /// A definition is invalid.
    #[error("Invalid watchtower '{name}': {source}")]
    InvalidWatchtower {
        /// The watchtower's name template.
        name: String,
        /// What is wrong with it.
        #[source]
        source: ConfigurationError,
    },

    /// Two definitions share a name template.
    #[error("Duplicate watchtower name '{0}'")]
    DuplicateWatchtower(String),

    /// A definition lists the same validator twice.
    #[error("Watchtower '{name}' lists validator '{validator}' more than once")]
    RepeatedValidator {
        /// The watchtower's name template.
        name: String,
        /// The repeated validator name.
        validator: String,
    },
}

impl ConfigLoader {
    /// Creates a new `ConfigLoader`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Loads the list stored under the top-level `key`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, LoaderError> {
        if !self.is_yaml_file() {
            return Err(LoaderError::UnsupportedFormat);
        }

        let config_str = fs::read_to_string(&self.path)?;

        let config = Config::builder()
            .add_source(File::from_str(&config_str, FileFormat::Yaml))
            .build()?;

        let items = config.get(key)?;

        Ok(items)
    }

    /// Loads the `watchtowers` list and checks names and custom macros.
    pub fn load_watchtowers(&self) -> Result<Vec<WatchtowerConfig>, LoaderError> {
        let watchtowers: Vec<WatchtowerConfig> = self.load("watchtowers")?;

        let mut seen = HashSet::new();
        for watchtower in &watchtowers {
            if !seen.insert(watchtower.name.as_str()) {
                return Err(LoaderError::DuplicateWatchtower(watchtower.name.clone()));
            }
            if let Some(bad) = watchtower.macros.keys().find(|name| !is_valid_macro_name(name)) {
                return Err(LoaderError::InvalidWatchtower {
                    name: watchtower.name.clone(),
                    source: ConfigurationError::InvalidMacroName(bad.clone()),
                });
            }
            if let Some(validator) = watchtower.repeated_validator() {
                return Err(LoaderError::RepeatedValidator {
                    name: watchtower.name.clone(),
                    validator: validator.to_string(),
                });
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            count = watchtowers.len(),
            "Watchtowers loaded."
        );
        Ok(watchtowers)
    }

    /// Checks if the file has a YAML extension.
    fn is_yaml_file(&self) -> bool {
        matches!(self.path.extension().and_then(|ext| ext.to_str()), Some("yaml") | Some("yml"))
    }
}
