use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::{
    Column, ConnectOptions, Connection, Row, ValueRef,
    sqlite::{SqliteConnectOptions, SqliteRow},
};

use super::{DataLoader, LoadError};
use crate::{
    models::Dataset,
    plugins::{LoaderPlugin, ParamField, ParamType, PluginParams},
};

/// Parameters of [`DatabaseLoader`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseLoaderParams {
    /// SQL text to run.
    pub query: String,
    /// Database URL, e.g. `sqlite://data.db`.
    pub connection: String,
}

impl PluginParams for DatabaseLoaderParams {
    fn fields() -> Vec<ParamField> {
        vec![
            ParamField::required("query", ParamType::String).describe("SQL query to run"),
            ParamField::required("connection", ParamType::String)
                .describe("Database URL, e.g. sqlite://data.db"),
        ]
    }
}

/// Runs a query against a SQLite database and returns the result set.
///
/// The database is opened read-only for the duration of one load.
#[derive(Debug, Clone)]
pub struct DatabaseLoader {
    params: DatabaseLoaderParams,
}

impl LoaderPlugin for DatabaseLoader {
    const NAME: &'static str = "database_loader";
    type Params = DatabaseLoaderParams;

    fn from_params(params: Self::Params) -> Self {
        Self { params }
    }
}

#[async_trait]
impl DataLoader for DatabaseLoader {
    async fn load(&self) -> Result<Dataset, LoadError> {
        let options = SqliteConnectOptions::from_str(&self.params.connection)
            .map_err(LoadError::Connection)?
            .read_only(true);
        let mut conn = options.connect().await.map_err(LoadError::Connection)?;

        tracing::debug!(query = %self.params.query, "Running loader query.");
        let fetched = sqlx::query(&self.params.query).fetch_all(&mut conn).await;

        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "Failed to close loader connection.");
        }
        let rows = fetched.map_err(LoadError::Query)?;

        let columns = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();
        let values = rows
            .iter()
            .map(|row| (0..row.len()).map(|index| decode_value(row, index)).collect())
            .collect();

        let dataset = Dataset::new(columns, values)?;
        tracing::debug!(rows = dataset.row_count(), "Loader query finished.");
        Ok(dataset)
    }
}

/// Converts one SQLite cell to JSON using the value's storage class.
fn decode_value(row: &SqliteRow, index: usize) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Value::Null,
    }
    if let Ok(v) = row.try_get::<i64, _>(index) {
        return json!(v);
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return json!(v);
    }
    if let Ok(v) = row.try_get::<String, _>(index) {
        return Value::String(v);
    }
    if let Ok(v) = row.try_get::<Vec<u8>, _>(index) {
        return json!(v);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn seeded_db(dir: &TempDir) -> String {
        let path = dir.path().join("prices.db");
        let url = format!("sqlite://{}", path.display());
        let mut conn = SqliteConnectOptions::from_str(&url)
            .unwrap()
            .create_if_missing(true)
            .connect()
            .await
            .unwrap();
        sqlx::query("CREATE TABLE prices (code TEXT, high REAL, volume INTEGER, note BLOB)")
            .execute(&mut conn)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO prices VALUES ('a', 1.5, 10, NULL), ('b', NULL, 20, x'0102')",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        conn.close().await.unwrap();
        url
    }

    fn loader(url: &str, query: &str) -> DatabaseLoader {
        DatabaseLoader::from_params(DatabaseLoaderParams {
            query: query.to_string(),
            connection: url.to_string(),
        })
    }

    #[tokio::test]
    async fn test_load_decodes_storage_classes() {
        let dir = TempDir::new().unwrap();
        let url = seeded_db(&dir).await;

        let data = loader(&url, "SELECT code, high, volume, note FROM prices ORDER BY code")
            .load()
            .await
            .unwrap();

        assert_eq!(data.columns(), &["code", "high", "volume", "note"]);
        assert_eq!(data.rows()[0], vec![json!("a"), json!(1.5), json!(10), Value::Null]);
        assert_eq!(data.rows()[1], vec![json!("b"), Value::Null, json!(20), json!([1, 2])]);
        assert_eq!(data.null_count("high").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_load_empty_result() {
        let dir = TempDir::new().unwrap();
        let url = seeded_db(&dir).await;

        let data = loader(&url, "SELECT * FROM prices WHERE code = 'zzz'")
            .load()
            .await
            .unwrap();

        assert_eq!(data.row_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_query_is_a_query_error() {
        let dir = TempDir::new().unwrap();
        let url = seeded_db(&dir).await;

        let result = loader(&url, "SELECT * FROM missing_table").load().await;

        assert!(matches!(result, Err(LoadError::Query(_))));
    }

    #[tokio::test]
    async fn test_unreachable_database_is_a_connection_error() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("nope.db").display());

        let result = loader(&url, "SELECT 1").load().await;

        assert!(matches!(result, Err(LoadError::Connection(_))));
    }
}
