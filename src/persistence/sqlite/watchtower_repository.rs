//! Implementation of the WatchtowerRepository trait for
//! SqliteWatchtowerRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{from_micros, to_micros};
use crate::{
    models::{HistoryEntry, MonitorStatus, RunKind, RunRecord, WatchtowerConfig},
    persistence::{
        error::PersistenceError, sqlite::SqliteWatchtowerRepository, traits::WatchtowerRepository,
    },
};

// Helper struct for mapping from the database row
#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: i64,
    run_id: String,
    monitor: String,
    name: String,
    run_kind: String,
    success: bool,
    ignored: bool,
    run_time: i64,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = PersistenceError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(HistoryEntry {
            id: row.id,
            run_id: row.run_id,
            monitor: row.monitor,
            name: row.name,
            run_kind: row.run_kind.parse().map_err(PersistenceError::InvalidInput)?,
            success: row.success,
            ignored: row.ignored,
            run_time: from_micros(row.run_time)?,
        })
    }
}

// Helper struct for mapping from the database row
#[derive(sqlx::FromRow)]
struct StatusRow {
    name: String,
    success: Option<bool>,
    status_time: Option<i64>,
}

#[async_trait]
impl WatchtowerRepository for SqliteWatchtowerRepository {
    /// Looks up a watchtower by its name template.
    #[tracing::instrument(skip(self), level = "debug")]
    async fn get_watchtower(
        &self,
        name: &str,
    ) -> Result<Option<WatchtowerConfig>, PersistenceError> {
        tracing::debug!(name, "Querying for watchtower.");

        let config: Option<String> = self
            .execute_query_with_error_handling(
                "query watchtower",
                sqlx::query_scalar::<_, String>("SELECT config FROM watchtowers WHERE name = ?")
                    .bind(name)
                    .fetch_optional(&self.pool),
            )
            .await?;

        match config {
            Some(config) => Ok(Some(serde_json::from_str(&config)?)),
            None => {
                tracing::debug!(name, "No watchtower found.");
                Ok(None)
            }
        }
    }

    /// Lists every stored watchtower, ordered by name.
    #[tracing::instrument(skip(self), level = "debug")]
    async fn list_watchtowers(&self) -> Result<Vec<WatchtowerConfig>, PersistenceError> {
        let configs: Vec<String> = self
            .execute_query_with_error_handling(
                "list watchtowers",
                sqlx::query_scalar::<_, String>("SELECT config FROM watchtowers ORDER BY name")
                    .fetch_all(&self.pool),
            )
            .await?;

        let watchtowers = configs
            .iter()
            .map(|config| serde_json::from_str(config).map_err(PersistenceError::from))
            .collect::<Result<Vec<WatchtowerConfig>, _>>()?;

        tracing::debug!(count = watchtowers.len(), "Watchtowers retrieved successfully.");
        Ok(watchtowers)
    }

    /// Stores a new watchtower.
    #[tracing::instrument(skip(self, config), fields(name = %config.name), level = "debug")]
    async fn add_watchtower(&self, config: &WatchtowerConfig) -> Result<(), PersistenceError> {
        let serialized = serde_json::to_string(config)?;
        let now = to_micros(Utc::now());

        let result = self
            .execute_query_with_error_handling(
                "insert watchtower",
                sqlx::query(
                    "INSERT OR IGNORE INTO watchtowers (name, config, created_at, updated_at) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(&config.name)
                .bind(&serialized)
                .bind(now)
                .bind(now)
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            tracing::warn!(name = %config.name, "Watchtower already exists.");
            return Err(PersistenceError::AlreadyExists(config.name.clone()));
        }

        tracing::info!(name = %config.name, "Watchtower added.");
        Ok(())
    }

    /// Deletes a watchtower and its run history.
    #[tracing::instrument(skip(self), level = "debug")]
    async fn delete_watchtower(&self, name: &str) -> Result<(), PersistenceError> {
        let mut tx = self
            .execute_query_with_error_handling("begin transaction", self.pool.begin())
            .await?;

        self.execute_query_with_error_handling(
            "delete run history",
            sqlx::query("DELETE FROM run_details WHERE monitor = ?").bind(name).execute(&mut *tx),
        )
        .await?;

        let result = self
            .execute_query_with_error_handling(
                "delete watchtower",
                sqlx::query("DELETE FROM watchtowers WHERE name = ?").bind(name).execute(&mut *tx),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound(name.to_string()));
        }

        self
            .execute_query_with_error_handling("commit transaction", tx.commit())
            .await?;
        tracing::info!(name, "Watchtower deleted.");
        Ok(())
    }

    /// Stores one run row plus one row per validator result.
    #[tracing::instrument(skip(self, record), level = "debug")]
    async fn save_run(
        &self,
        monitor: &str,
        record: &RunRecord,
    ) -> Result<String, PersistenceError> {
        let run_id = Uuid::new_v4().to_string();
        let macro_maps = serde_json::to_string(&record.macro_maps)?;
        let metrics = serde_json::to_string(&record.metrics)?;
        let extra = serde_json::to_string(&record.extra)?;

        let mut tx = self
            .execute_query_with_error_handling("begin transaction", self.pool.begin())
            .await?;

        self.execute_query_with_error_handling(
            "insert run",
            sqlx::query(
                "INSERT INTO run_details \
                 (run_id, monitor, name, run_kind, success, run_time, macro_maps, metrics, extra) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&run_id)
            .bind(monitor)
            .bind(&record.name)
            .bind(RunKind::Run.as_str())
            .bind(record.success)
            .bind(to_micros(record.run_time))
            .bind(&macro_maps)
            .bind(&metrics)
            .bind(&extra)
            .execute(&mut *tx),
        )
        .await?;

        for result in &record.validators_result {
            let metrics = serde_json::to_string(&result.metrics)?;
            let params = serde_json::to_string(&result.params)?;
            let extra = serde_json::to_string(&result.extra)?;
            self.execute_query_with_error_handling(
                "insert validator result",
                sqlx::query(
                    "INSERT INTO run_details \
                     (run_id, monitor, name, run_kind, success, run_time, metrics, params, extra) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&run_id)
                .bind(monitor)
                .bind(&result.name)
                .bind(RunKind::Validator.as_str())
                .bind(result.success)
                .bind(to_micros(result.run_time))
                .bind(&metrics)
                .bind(&params)
                .bind(&extra)
                .execute(&mut *tx),
            )
            .await?;
        }

        self
            .execute_query_with_error_handling("commit transaction", tx.commit())
            .await?;

        tracing::info!(
            monitor,
            run_id = %run_id,
            validators = record.validators_result.len(),
            "Run saved."
        );
        Ok(run_id)
    }

    /// Returns history rows oldest first.
    #[tracing::instrument(skip(self), level = "debug")]
    async fn list_run_history(
        &self,
        monitor: &str,
        validator_name: Option<String>,
        run_kind: RunKind,
    ) -> Result<Vec<HistoryEntry>, PersistenceError> {
        let rows: Vec<HistoryRow> = self
            .execute_query_with_error_handling(
                "query run history",
                sqlx::query_as::<_, HistoryRow>(
                    "SELECT id, run_id, monitor, name, run_kind, success, ignored, run_time \
                     FROM run_details \
                     WHERE monitor = ? AND run_kind = ? AND (? IS NULL OR name = ?) \
                     ORDER BY run_time ASC, id ASC",
                )
                .bind(monitor)
                .bind(run_kind.as_str())
                .bind(validator_name.as_deref())
                .bind(validator_name.as_deref())
                .fetch_all(&self.pool),
            )
            .await?;

        let entries =
            rows
                .into_iter()
                .map(HistoryEntry::try_from)
                .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(monitor, count = entries.len(), "Run history retrieved.");
        Ok(entries)
    }

    /// Marks a history row as ignored (or not).
    #[tracing::instrument(skip(self), level = "debug")]
    async fn set_ignored(&self, entry_id: i64, ignored: bool) -> Result<(), PersistenceError> {
        let result = self
            .execute_query_with_error_handling(
                "set ignored",
                sqlx::query("UPDATE run_details SET ignored = ? WHERE id = ?")
                    .bind(ignored)
                    .bind(entry_id)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound(format!("history entry {entry_id}")));
        }
        Ok(())
    }

    /// Writes the rolled-up status of a monitor.
    #[tracing::instrument(skip(self), level = "debug")]
    async fn update_status(
        &self,
        monitor: &str,
        success: bool,
        computed_at: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        let computed_at = to_micros(computed_at);
        let result = self
            .execute_query_with_error_handling(
                "update status",
                sqlx::query(
                    "UPDATE watchtowers SET success = ?, status_time = ?, updated_at = ? \
                     WHERE name = ?",
                )
                .bind(success)
                .bind(computed_at)
                .bind(computed_at)
                .bind(monitor)
                .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound(monitor.to_string()));
        }
        tracing::debug!(monitor, success, "Monitor status updated.");
        Ok(())
    }

    /// Reads the rolled-up status of a monitor.
    #[tracing::instrument(skip(self), level = "debug")]
    async fn get_status(&self, monitor: &str) -> Result<Option<MonitorStatus>, PersistenceError> {
        let row: Option<StatusRow> = self
            .execute_query_with_error_handling(
                "query status",
                sqlx::query_as::<_, StatusRow>(
                    "SELECT name, success, status_time FROM watchtowers WHERE name = ?",
                )
                .bind(monitor)
                .fetch_optional(&self.pool),
            )
            .await?;

        row.map(|row| {
            Ok(MonitorStatus {
                monitor: row.name,
                success: row.success,
                computed_at: row.status_time.map(from_micros).transpose()?,
            })
        })
        .transpose()
    }
}
