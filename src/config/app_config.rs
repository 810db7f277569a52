use std::{collections::HashMap, path::PathBuf, time::Duration};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use super::deserialize_duration_from_seconds;

/// Provides the default value for concurrency.
fn default_concurrency() -> usize {
    4
}

/// Provides the default value for run_timeout.
fn default_run_timeout() -> Duration {
    Duration::from_secs(600)
}

/// Application configuration for the watchtower runner.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Database URL of the SQLite store for watchtowers and run history.
    pub database_url: String,

    /// Path to the watchtower definitions file.
    #[serde(skip_deserializing)]
    pub watchtower_config_path: PathBuf,

    /// Plugin locations walked after the built-ins, in order.
    #[serde(default)]
    pub plugin_locations: Vec<String>,

    /// Maximum number of watchtowers run at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Deadline for a single watchtower run, in seconds.
    #[serde(
        deserialize_with = "deserialize_duration_from_seconds",
        default = "default_run_timeout"
    )]
    pub run_timeout: Duration,
}

impl AppConfig {
    /// Creates a new `AppConfig` from `<config_dir>/app.yaml` and `WATCHTOWER__*`
    /// environment variables. `WATCHTOWER__PLUGIN_LOCATIONS` takes a
    /// `;`-separated list.
    pub fn new(config_dir: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_sources(config_dir, None)
    }

    fn from_sources(
        config_dir: Option<&str>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let config_dir_str = config_dir.unwrap_or("configs");
        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/app.yaml", config_dir_str)))
            .add_source(
                Environment::with_prefix("WATCHTOWER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(";")
                    .with_list_parse_key("plugin_locations")
                    .source(env),
            )
            .build()?;
        let mut config: Self = s.try_deserialize()?;

        config.watchtower_config_path = PathBuf::from(config_dir_str).join("watchtowers.yaml");

        Ok(config)
    }
}
