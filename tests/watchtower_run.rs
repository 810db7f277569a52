//! End-to-end runs of the watchtower pipeline against SQLite data.

use std::str::FromStr;

use serde_json::json;
use sqlx::{ConnectOptions, Connection, sqlite::SqliteConnectOptions};
use tempfile::TempDir;
use watchtower::{
    loaders::LoadError,
    macros::{MacroRegistry, MacroSpec, collect_used_macros, substitute},
    models::{LoaderSpec, ValidatorSpec},
    plugins::{PluginRegistry, StaticDiscovery},
    test_helpers::{failing_validator_registration, params},
    watchtower::{RunError, Watchtower},
};

async fn score_db(dir: &TempDir, rows: usize) -> String {
    let path = dir.path().join("scores.db");
    let url = format!("sqlite://{}", path.display());
    let mut conn = SqliteConnectOptions::from_str(&url)
        .unwrap()
        .create_if_missing(true)
        .connect()
        .await
        .unwrap();
    sqlx::query("CREATE TABLE score (day TEXT, name TEXT, high REAL)")
        .execute(&mut conn)
        .await
        .unwrap();
    for i in 0..rows {
        sqlx::query("INSERT INTO score VALUES ('2024-01-01', ?, ?)")
            .bind(format!("player-{i}"))
            .bind(i as f64)
            .execute(&mut conn)
            .await
            .unwrap();
    }
    conn.close().await.unwrap();
    url
}

fn database_loader(url: &str, query: &str) -> LoaderSpec {
    LoaderSpec::new("database_loader", params(json!({"connection": url, "query": query})))
}

#[tokio::test]
async fn test_empty_dataset_passes_not_null_vacuously() {
    let dir = TempDir::new().unwrap();
    let url = score_db(&dir, 0).await;
    let registry = PluginRegistry::builtin().unwrap();

    let watchtower = Watchtower::new("empty", database_loader(&url, "SELECT * FROM score"))
        .with_validator(ValidatorSpec::new(
            "expect_column_values_to_not_be_null",
            params(json!({"column": "high"})),
        ));

    let record = watchtower.run(&registry).await.unwrap();

    let result = &record.validators_result[0];
    assert!(result.success);
    assert_eq!(result.metrics["null_rows"], json!(0));
    assert_eq!(result.metrics["total_rows"], json!(0));
}

#[tokio::test]
async fn test_row_count_below_minimum_fails() {
    let dir = TempDir::new().unwrap();
    let url = score_db(&dir, 10).await;
    let registry = PluginRegistry::builtin().unwrap();

    let watchtower = Watchtower::new("ten rows", database_loader(&url, "SELECT * FROM score"))
        .with_validator(ValidatorSpec::new(
            "expect_row_count_to_be_between",
            params(json!({"min_value": 50, "max_value": null})),
        ));

    let record = watchtower.run(&registry).await.unwrap();

    let result = &record.validators_result[0];
    assert!(!result.success);
    assert_eq!(result.metrics["rows"], json!(10));
    assert!(record.success);
    assert!(!record.validators_passed());
}

#[tokio::test]
async fn test_name_template_resolution() {
    let dir = TempDir::new().unwrap();
    let url = score_db(&dir, 1).await;
    let registry = PluginRegistry::builtin().unwrap();

    let watchtower = Watchtower::new("daily-${today}", database_loader(&url, "SELECT 1"))
        .with_macro(MacroSpec::fixed("today", "20240101").unwrap());
    let record = watchtower.run(&registry).await.unwrap();
    assert_eq!(record.name, "daily-20240101");
    assert_eq!(record.monitor, "daily-${today}");

    let unresolved = collect_used_macros(["daily-${today}"], &MacroRegistry::new());
    assert!(unresolved.is_empty());
    assert_eq!(substitute("daily-${today}", &unresolved), "daily-${today}");
}

#[tokio::test]
async fn test_macros_reach_loader_query_and_validator_params() {
    let dir = TempDir::new().unwrap();
    let url = score_db(&dir, 3).await;
    let registry = PluginRegistry::builtin().unwrap();

    let watchtower = Watchtower::new(
        "scores ${day}",
        database_loader(&url, "SELECT * FROM score WHERE day = '${day}'"),
    )
    .with_macro(MacroSpec::fixed("day", "2024-01-01").unwrap())
    .with_macro(MacroSpec::producer("expected", || json!(3)).unwrap())
    .with_validator(ValidatorSpec::new(
        "expect_row_count_to_be_between",
        params(json!({"min_value": "${expected}", "max_value": "$expected"})),
    ));

    let record = watchtower.run(&registry).await.unwrap();

    assert_eq!(record.name, "scores 2024-01-01");
    let result = &record.validators_result[0];
    assert!(result.success);
    assert_eq!(result.params["min_value"], json!("3"));
    assert_eq!(record.macro_maps["expected"], json!(3));
}

#[tokio::test]
async fn test_raising_validator_produces_no_record() {
    let dir = TempDir::new().unwrap();
    let url = score_db(&dir, 2).await;
    let discovery = StaticDiscovery::new().with(failing_validator_registration("raises", "acme"));
    let registry = PluginRegistry::build(&discovery, &["acme".to_string()]).unwrap();

    let watchtower = Watchtower::new("wt", database_loader(&url, "SELECT * FROM score"))
        .with_validator(ValidatorSpec::new(
            "expect_row_count_to_be_between",
            params(json!({"min_value": 1})),
        ))
        .with_validator(ValidatorSpec::new("raises", params(json!({}))));

    let result = watchtower.run(&registry).await;

    assert!(matches!(
        result,
        Err(RunError::Validation { ref validator, .. }) if validator == "raises"
    ));
}

#[tokio::test]
async fn test_bad_query_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    let url = score_db(&dir, 1).await;
    let registry = PluginRegistry::builtin().unwrap();

    let watchtower = Watchtower::new("wt", database_loader(&url, "SELECT * FROM missing_table"));

    let result = watchtower.run(&registry).await;

    assert!(matches!(
        result,
        Err(RunError::Load {
            source: LoadError::Query(_),
            ..
        })
    ));
}
