//! This module provides the `RunnerBuilder` for constructing a `Runner`.

use std::sync::Arc;

use crate::{
    config::AppConfig,
    macros::MacroSpec,
    persistence::traits::WatchtowerRepository,
    plugins::{PluginDiscovery, RegistryCache, StaticDiscovery},
};

use super::{Runner, RunnerError};

/// A builder for creating a `Runner` instance.
#[derive(Default)]
pub struct RunnerBuilder {
    config: Option<AppConfig>,
    repository: Option<Arc<dyn WatchtowerRepository>>,
    discovery: Option<Arc<dyn PluginDiscovery>>,
    macros: Vec<MacroSpec>,
}

impl RunnerBuilder {
    /// Creates a new, empty `RunnerBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application configuration for the `Runner`.
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the repository holding watchtowers and their history.
    pub fn repository(mut self, repository: Arc<dyn WatchtowerRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Sets where custom plugins are discovered. Without one only the
    /// built-ins are available.
    pub fn discovery(mut self, discovery: Arc<dyn PluginDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Adds a macro available to every watchtower, typically a producer that
    /// cannot be stored with the watchtower definition. A watchtower's own
    /// macros take precedence.
    pub fn macro_spec(mut self, spec: MacroSpec) -> Self {
        self.macros.push(spec);
        self
    }

    /// Assembles the `Runner`. The plugin registry is built lazily on the
    /// first run.
    pub fn build(self) -> Result<Runner, RunnerError> {
        let config = self.config.ok_or(RunnerError::MissingConfig)?;
        let repository = self.repository.ok_or(RunnerError::MissingRepository)?;
        let discovery = self.discovery.unwrap_or_else(|| Arc::new(StaticDiscovery::new()));

        tracing::debug!(
            locations = ?config.plugin_locations,
            concurrency = config.concurrency,
            "Assembling runner."
        );
        let registry = Arc::new(RegistryCache::new(discovery, config.plugin_locations.clone()));

        Ok(Runner {
            config: Arc::new(config),
            repository,
            registry,
            macros: Arc::new(self.macros),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::persistence::traits::MockWatchtowerRepository;

    fn config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            watchtower_config_path: Default::default(),
            plugin_locations: vec!["custom".to_string()],
            concurrency: 2,
            run_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn build_succeeds_with_config_and_repository() {
        let runner = RunnerBuilder::new()
            .config(config())
            .repository(Arc::new(MockWatchtowerRepository::new()))
            .build()
            .unwrap();
        assert_eq!(runner.registry().locations(), ["custom".to_string()]);
        assert!(!runner.registry().is_built());
    }

    #[test]
    fn build_fails_if_config_is_missing() {
        let result =
            RunnerBuilder::new()
                .repository(Arc::new(MockWatchtowerRepository::new()))
                .build();
        assert!(matches!(result, Err(RunnerError::MissingConfig)));
    }

    #[test]
    fn build_fails_if_repository_is_missing() {
        let result = RunnerBuilder::new().config(config()).build();
        assert!(matches!(result, Err(RunnerError::MissingRepository)));
    }
}
