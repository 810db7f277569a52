//! This module provides the `InitializationService` responsible for loading
//! watchtower definitions from the configuration file into the database.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::{AppConfig, ConfigLoader},
    models::WatchtowerConfig,
    persistence::{error::PersistenceError, traits::WatchtowerRepository},
    plugins::{PluginKind, PluginRegistry, RegistryCache},
    watchtower::Watchtower,
};

/// Errors that can occur during initialization.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// An error occurred while loading watchtowers from the configuration
    /// file.
    #[error("Failed to load watchtowers from file: {0}")]
    WatchtowerLoadError(String),

    /// A watchtower references a plugin that is not registered, or its
    /// macros are invalid.
    #[error("Watchtower '{name}' is invalid: {reason}")]
    InvalidWatchtower {
        /// The watchtower's name template.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Reading or writing the database failed.
    #[error("Failed to store watchtowers: {0}")]
    Persistence(#[from] PersistenceError),
}

/// A service responsible for seeding the database with watchtower
/// definitions.
pub struct InitializationService {
    config: AppConfig,
    repo: Arc<dyn WatchtowerRepository>,
    registry: Arc<RegistryCache>,
}

impl InitializationService {
    /// Creates a new `InitializationService`.
    pub fn new(
        config: AppConfig,
        repo: Arc<dyn WatchtowerRepository>,
        registry: Arc<RegistryCache>,
    ) -> Self {
        Self {
            config,
            repo,
            registry,
        }
    }

    /// Loads the watchtower file, checks every definition against the plugin
    /// registry and stores the ones not stored yet. Returns how many were
    /// added.
    pub async fn run(&self) -> Result<usize, InitializationError> {
        let config_path = &self.config.watchtower_config_path;
        tracing::info!(
            config_path = %config_path.display(),
            "Loading watchtowers from configuration file..."
        );

        let watchtowers = ConfigLoader::new(config_path.clone())
            .load_watchtowers()
            .map_err(|e| InitializationError::WatchtowerLoadError(e.to_string()))?;

        let registry = self
            .registry
            .get()
            .map_err(|e| InitializationError::WatchtowerLoadError(e.to_string()))?;
        for watchtower in &watchtowers {
            validate(&registry, watchtower)?;
        }

        let mut added = 0;
        for watchtower in watchtowers {
            if self.repo.get_watchtower(&watchtower.name).await?.is_some() {
                tracing::info!(name = %watchtower.name, "Watchtower already stored. Skipping.");
                continue;
            }
            self.repo.add_watchtower(&watchtower).await?;
            added += 1;
        }

        tracing::info!(added, "Watchtowers from file stored in database.");
        Ok(added)
    }
}

/// Checks that every plugin a watchtower names is registered.
fn validate(
    registry: &PluginRegistry,
    config: &WatchtowerConfig,
) -> Result<(), InitializationError> {
    let invalid = |reason: String| InitializationError::InvalidWatchtower {
        name: config.name.clone(),
        reason,
    };

    Watchtower::from_config(config.clone()).map_err(|e| invalid(e.to_string()))?;
    if !registry.contains(PluginKind::Loader, &config.loader.loader) {
        return Err(invalid(format!("unknown data loader '{}'", config.loader.loader)));
    }
    if let Some(spec) = config
        .validators
        .iter()
        .find(|spec| !registry.contains(PluginKind::Validator, &spec.validator))
    {
        return Err(invalid(format!("unknown validator '{}'", spec.validator)));
    }
    Ok(())
}
