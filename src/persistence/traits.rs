//! The storage contract for watchtower definitions, run history and monitor
//! status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::{
    models::{HistoryEntry, MonitorStatus, RunKind, RunRecord, WatchtowerConfig},
    persistence::error::PersistenceError,
};

/// Stores watchtowers and the outcomes of their runs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WatchtowerRepository: Send + Sync {
    /// Looks up a watchtower by its name template.
    async fn get_watchtower(&self, name: &str)
    -> Result<Option<WatchtowerConfig>, PersistenceError>;

    /// Lists every stored watchtower, ordered by name.
    async fn list_watchtowers(&self) -> Result<Vec<WatchtowerConfig>, PersistenceError>;

    /// Stores a new watchtower. Fails with `AlreadyExists` if the name is
    /// taken.
    async fn add_watchtower(&self, config: &WatchtowerConfig) -> Result<(), PersistenceError>;

    /// Deletes a watchtower and its run history. Fails with `NotFound` if
    /// there is no such watchtower.
    async fn delete_watchtower(&self, name: &str) -> Result<(), PersistenceError>;

    /// Stores one run row plus one row per validator result under a fresh
    /// run id, atomically. Returns the run id.
    async fn save_run(&self, monitor: &str, record: &RunRecord)
    -> Result<String, PersistenceError>;

    /// Returns the history rows of `monitor` of the given kind, oldest first.
    /// Ties on run time are ordered by row id.
    async fn list_run_history(
        &self,
        monitor: &str,
        validator_name: Option<String>,
        run_kind: RunKind,
    ) -> Result<Vec<HistoryEntry>, PersistenceError>;

    /// Marks a history row as ignored (or not).
    async fn set_ignored(&self, entry_id: i64, ignored: bool) -> Result<(), PersistenceError>;

    /// Writes the rolled-up status of a monitor.
    async fn update_status(
        &self,
        monitor: &str,
        success: bool,
        computed_at: DateTime<Utc>,
    ) -> Result<(), PersistenceError>;

    /// Reads the rolled-up status of a monitor, `None` if it is not stored.
    async fn get_status(&self, monitor: &str) -> Result<Option<MonitorStatus>, PersistenceError>;
}
