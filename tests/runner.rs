//! Integration tests for the runner over a file-backed SQLite repository.

use std::{fs, sync::Arc, time::Duration};

use serde_json::json;
use tempfile::TempDir;
use watchtower::{
    config::AppConfig,
    initialization::InitializationService,
    models::{RunKind, SuccessPolicy},
    persistence::{sqlite::SqliteWatchtowerRepository, traits::WatchtowerRepository},
    runner::{Runner, RunnerError},
    test_helpers::{DatasetBuilder, WatchtowerBuilder, params, test_discovery},
};

async fn setup(dir: &TempDir) -> (AppConfig, Arc<SqliteWatchtowerRepository>) {
    let database_url = format!("sqlite://{}", dir.path().join("watchtower.db").display());
    let repo = Arc::new(SqliteWatchtowerRepository::new(&database_url).await.unwrap());
    repo.run_migrations().await.unwrap();
    let config = AppConfig {
        database_url,
        watchtower_config_path: dir.path().join("watchtowers.yaml"),
        plugin_locations: vec!["test".to_string()],
        concurrency: 2,
        run_timeout: Duration::from_secs(10),
    };
    (config, repo)
}

fn runner(config: AppConfig, repo: Arc<SqliteWatchtowerRepository>) -> Runner {
    let data = DatasetBuilder::new(&["high"])
        .row(vec![json!(1)])
        .row(vec![json!(null)])
        .build();
    Runner::builder()
        .config(config)
        .repository(repo as Arc<dyn WatchtowerRepository>)
        .discovery(Arc::new(test_discovery(data)))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_run_one_stores_history_and_status() {
    let dir = TempDir::new().unwrap();
    let (config, repo) = setup(&dir).await;
    repo.add_watchtower(
        &WatchtowerBuilder::new("nulls")
            .validator("expect_column_values_to_not_be_null", params(json!({"column": "high"})))
            .build(),
    )
    .await
    .unwrap();

    let outcome = runner(config, Arc::clone(&repo))
        .run_one("nulls")
        .await
        .unwrap();

    assert!(!outcome.monitor_success);
    let runs = repo
        .list_run_history("nulls", None, RunKind::Run)
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, outcome.run_id);
    let validators = repo
        .list_run_history("nulls", None, RunKind::Validator)
        .await
        .unwrap();
    assert_eq!(validators.len(), 1);
    assert!(!validators[0].success);
    assert_eq!(repo.get_status("nulls").await.unwrap().unwrap().success, Some(false));
}

#[tokio::test]
async fn test_run_all_runs_every_watchtower() {
    let dir = TempDir::new().unwrap();
    let (config, repo) = setup(&dir).await;
    for i in 0..5 {
        repo.add_watchtower(
            &WatchtowerBuilder::new(&format!("wt-{i}"))
                .validator("always_pass", params(json!({})))
                .policy(SuccessPolicy::Last)
                .build(),
        )
        .await
        .unwrap();
    }
    repo.add_watchtower(
        &WatchtowerBuilder::new("broken").loader("broken_loader", params(json!({}))).build(),
    )
    .await
    .unwrap();

    let results = runner(config, Arc::clone(&repo)).run_all().await.unwrap();

    assert_eq!(results.len(), 6);
    let (ok, failed): (Vec<_>, Vec<_>) = results.iter().partition(|(_, r)| r.is_ok());
    assert_eq!(ok.len(), 5);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "broken");
    assert!(repo.list_run_history("broken", None, RunKind::Run).await.unwrap().is_empty());
    for i in 0..5 {
        let status = repo.get_status(&format!("wt-{i}")).await.unwrap().unwrap();
        assert_eq!(status.success, Some(true));
    }
}

#[tokio::test]
async fn test_unknown_watchtower_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (config, repo) = setup(&dir).await;

    let result = runner(config, repo).run_one("missing").await;

    assert!(matches!(result, Err(RunnerError::NotFound(_))));
}

#[tokio::test]
async fn test_init_then_run_from_yaml() {
    let dir = TempDir::new().unwrap();
    let (config, repo) = setup(&dir).await;
    fs::write(
        &config.watchtower_config_path,
        r#"
watchtowers:
  - name: "rows ${year:1}"
    macros:
      min_rows: 2
    loader:
      loader: static_loader
    validators:
      - validator: expect_row_count_to_be_between
        params:
          min_value: "${min_rows}"
"#,
    )
    .unwrap();

    let runner = runner(config.clone(), Arc::clone(&repo));
    let service = InitializationService::new(
        config,
        Arc::clone(&repo) as Arc<dyn WatchtowerRepository>,
        Arc::clone(runner.registry()),
    );
    assert_eq!(service.run().await.unwrap(), 1);
    assert_eq!(service.run().await.unwrap(), 0);

    let outcome = runner.run_one("rows ${year:1}").await.unwrap();

    assert!(outcome.record.validators_passed());
    assert_eq!(outcome.record.validators_result[0].params["min_value"], json!("2"));
    assert!(outcome.monitor_success);
}
