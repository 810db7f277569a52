//! The Runner ties stored watchtower definitions to the run pipeline.
//!
//! For each run it looks the watchtower up in the repository, runs it under
//! the configured deadline, persists the record and recomputes the monitor
//! status. [`Runner::run_all`] runs every stored watchtower as independent
//! tokio tasks, bounded by the configured concurrency.

mod builder;

use std::{sync::Arc, time::Duration};

pub use builder::RunnerBuilder;
use thiserror::Error;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    config::AppConfig,
    error::ConfigurationError,
    macros::MacroSpec,
    models::RunRecord,
    persistence::{error::PersistenceError, traits::WatchtowerRepository},
    plugins::{PluginError, RegistryCache},
    status::{StatusError, recompute_status},
    watchtower::{RunError, Watchtower},
};

/// Represents the set of errors that can occur while running watchtowers.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A required configuration was not provided to the `RunnerBuilder`.
    #[error("Missing configuration for Runner")]
    MissingConfig,

    /// A repository was not provided to the `RunnerBuilder`.
    #[error("Missing repository for Runner")]
    MissingRepository,

    /// No watchtower is stored under this name.
    #[error("Watchtower not found: {0}")]
    NotFound(String),

    /// The stored definition is invalid.
    #[error("Invalid watchtower configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The plugin registry could not be built.
    #[error("Plugin registry unavailable: {0}")]
    Plugin(#[from] PluginError),

    /// The run itself failed.
    #[error(transparent)]
    Run(#[from] RunError),

    /// The run did not finish before the deadline.
    #[error("Watchtower '{name}' did not finish within {timeout:?}")]
    Timeout {
        /// The watchtower's name template.
        name: String,
        /// The configured deadline.
        timeout: Duration,
    },

    /// Reading or writing storage failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The monitor status could not be recomputed.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// A spawned run panicked or was cancelled.
    #[error("Run task failed: {0}")]
    Task(String),
}

/// What one successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The stored run id.
    pub run_id: String,
    /// The record as returned by the pipeline.
    pub record: RunRecord,
    /// The recomputed monitor-level status.
    pub monitor_success: bool,
}

/// Runs stored watchtowers and records their outcomes.
#[derive(Clone)]
pub struct Runner {
    config: Arc<AppConfig>,
    repository: Arc<dyn WatchtowerRepository>,
    registry: Arc<RegistryCache>,
    macros: Arc<Vec<MacroSpec>>,
}

impl Runner {
    /// Creates a new `RunnerBuilder`.
    pub fn builder() -> RunnerBuilder {
        RunnerBuilder::new()
    }

    /// The plugin registry cache shared by every run.
    pub fn registry(&self) -> &Arc<RegistryCache> {
        &self.registry
    }

    /// The repository runs are stored in.
    pub fn repository(&self) -> &Arc<dyn WatchtowerRepository> {
        &self.repository
    }

    /// Runs the watchtower stored as `name`, stores the record and refreshes
    /// the monitor status.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn run_one(&self, name: &str) -> Result<RunOutcome, RunnerError> {
        let config = self
            .repository
            .get_watchtower(name)
            .await?
            .ok_or_else(|| RunnerError::NotFound(name.to_string()))?;

        let shared: Vec<MacroSpec> = self
            .macros
            .iter()
            .filter(|spec| !config.macros.contains_key(spec.name()))
            .cloned()
            .collect();
        let watchtower =
            shared
                .into_iter()
                .fold(Watchtower::from_config(config)?, Watchtower::with_macro);
        let registry = self.registry.get()?;

        let timeout = self.config.run_timeout;
        let record = tokio::time::timeout(timeout, watchtower.run(&registry))
            .await
            .map_err(|_| {
                tracing::error!(name, ?timeout, "Watchtower run timed out.");
                RunnerError::Timeout {
                    name: name.to_string(),
                    timeout,
                }
            })??;

        let run_id = self.repository.save_run(watchtower.name(), &record).await?;
        let monitor_success = recompute_status(
            self.repository.as_ref(),
            watchtower.name(),
            watchtower.success_policy(),
        )
        .await?;

        tracing::info!(
            name,
            run_id = %run_id,
            validators_passed = record.validators_passed(),
            monitor_success,
            "Watchtower run recorded."
        );
        Ok(RunOutcome {
            run_id,
            record,
            monitor_success,
        })
    }

    /// Runs every stored watchtower, at most `concurrency` at a time. One
    /// failing watchtower does not stop the others; results are ordered by
    /// name.
    #[tracing::instrument(skip(self), level = "info")]
    pub async fn run_all(
        &self,
    ) -> Result<Vec<(String, Result<RunOutcome, RunnerError>)>, RunnerError> {
        let names: Vec<String> = self
            .repository
            .list_watchtowers()
            .await?
            .into_iter()
            .map(|w| w.name)
            .collect();
        tracing::info!(
            count = names.len(),
            concurrency = self.config.concurrency,
            "Running all watchtowers."
        );

        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for name in names {
            let runner = self.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => runner.run_one(&name).await,
                    Err(e) => Err(RunnerError::Task(e.to_string())),
                };
                (name, result)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, result)) => {
                    if let Err(e) = &result {
                        tracing::error!(name = %name, error = %e, "Watchtower run failed.");
                    }
                    results.push((name, result));
                }
                Err(e) => {
                    tracing::error!(error = %e, "Run task failed.");
                    results.push((String::new(), Err(RunnerError::Task(e.to_string()))));
                }
            }
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::{
        models::RunKind,
        persistence::traits::MockWatchtowerRepository,
        test_helpers::{DatasetBuilder, WatchtowerBuilder, params, test_discovery},
    };

    fn config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            watchtower_config_path: Default::default(),
            plugin_locations: vec!["test".to_string()],
            concurrency: 2,
            run_timeout: Duration::from_secs(5),
        }
    }

    fn runner(repo: MockWatchtowerRepository) -> Runner {
        let data = DatasetBuilder::numbered_rows("id", 3);
        Runner::builder()
            .config(config())
            .repository(Arc::new(repo))
            .discovery(Arc::new(test_discovery(data)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_one_saves_and_recomputes() {
        let stored = WatchtowerBuilder::new("wt-${today}")
            .validator("always_pass", params(json!({})))
            .validator("always_fail", params(json!({})))
            .build();

        let mut repo = MockWatchtowerRepository::new();
        repo
            .expect_get_watchtower()
            .returning(move |_| Ok(Some(stored.clone())));
        repo
            .expect_save_run()
            .withf(|monitor, record| {
                monitor == "wt-${today}" && record.validators_result.len() == 2
            })
            .times(1)
            .returning(|_, _| Ok("run-1".to_string()));
        repo
            .expect_list_run_history()
            .withf(|monitor, _, kind| monitor == "wt-${today}" && *kind == RunKind::Validator)
            .returning(|_, _, _| Ok(vec![]));
        repo
            .expect_update_status()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let outcome = runner(repo).run_one("wt-${today}").await.unwrap();

        assert_eq!(outcome.run_id, "run-1");
        assert!(outcome.record.success);
        assert!(!outcome.record.validators_passed());
        assert!(outcome.monitor_success);
    }

    #[tokio::test]
    async fn test_run_one_unknown_watchtower() {
        let mut repo = MockWatchtowerRepository::new();
        repo.expect_get_watchtower().returning(|_| Ok(None));
        repo.expect_save_run().never();

        let result = runner(repo).run_one("missing").await;

        assert!(matches!(result, Err(RunnerError::NotFound(name)) if name == "missing"));
    }

    #[tokio::test]
    async fn test_failed_run_is_not_saved() {
        let stored = WatchtowerBuilder::new("wt")
            .validator("raises", params(json!({})))
            .build();
        let mut repo = MockWatchtowerRepository::new();
        repo
            .expect_get_watchtower()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_save_run().never();
        repo.expect_update_status().never();

        let result = runner(repo).run_one("wt").await;

        assert!(matches!(result, Err(RunnerError::Run(RunError::Validation { .. }))));
    }

    #[tokio::test]
    async fn test_runner_macros_reach_the_pipeline() {
        let stored = WatchtowerBuilder::new("wt-${batch}").build();
        let mut repo = MockWatchtowerRepository::new();
        repo
            .expect_get_watchtower()
            .returning(move |_| Ok(Some(stored.clone())));
        repo
            .expect_save_run()
            .returning(|_, _| Ok("run-1".to_string()));
        repo
            .expect_list_run_history()
            .returning(|_, _, _| Ok(vec![]));
        repo.expect_update_status().returning(|_, _, _| Ok(()));

        let data = DatasetBuilder::numbered_rows("id", 1);
        let runner = Runner::builder()
            .config(config())
            .repository(Arc::new(repo))
            .discovery(Arc::new(test_discovery(data)))
            .macro_spec(MacroSpec::producer("batch", || json!(42)).unwrap())
            .build()
            .unwrap();

        let outcome = runner.run_one("wt-${batch}").await.unwrap();

        assert_eq!(outcome.record.name, "wt-42");
        assert_eq!(outcome.record.monitor, "wt-${batch}");
    }

    #[tokio::test]
    async fn test_run_all_isolates_failures() {
        let good = WatchtowerBuilder::new("good").build();
        let bad = WatchtowerBuilder::new("bad")
            .loader("broken_loader", params(json!({})))
            .build();
        let listed = vec![good.clone(), bad.clone()];

        let mut repo = MockWatchtowerRepository::new();
        repo
            .expect_list_watchtowers()
            .returning(move || Ok(listed.clone()));
        repo.expect_get_watchtower().returning(move |name| {
            Ok(Some(if name == "good" { good.clone() } else { bad.clone() }))
        });
        repo
            .expect_save_run()
            .times(1)
            .returning(|_, _| Ok("run-1".to_string()));
        repo
            .expect_list_run_history()
            .returning(|_, _, _| Ok(vec![]));
        repo
            .expect_update_status()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let results = runner(repo).run_all().await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "bad");
        assert!(matches!(results[0].1, Err(RunnerError::Run(RunError::Load { .. }))));
        assert_eq!(results[1].0, "good");
        assert!(results[1].1.is_ok());
    }
}
