//! A builder for creating `HistoryEntry` instances in tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{HistoryEntry, RunKind};

/// A builder for creating `HistoryEntry` instances in tests.
#[derive(Debug, Clone)]
pub struct HistoryEntryBuilder {
    entry: HistoryEntry,
}

impl HistoryEntryBuilder {
    /// A successful, non-ignored validator entry with id `id`, stamped `id`
    /// minutes after 2024-01-01T00:00:00Z.
    pub fn new(id: i64, name: &str) -> Self {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        Self {
            entry: HistoryEntry {
                id,
                run_id: format!("run-{id}"),
                monitor: "monitor".to_string(),
                name: name.to_string(),
                run_kind: RunKind::Validator,
                success: true,
                ignored: false,
                run_time: base + chrono::Duration::minutes(id),
            },
        }
    }

    /// Sets the success flag.
    pub fn success(mut self, success: bool) -> Self {
        self.entry.success = success;
        self
    }

    /// Marks the entry as ignored.
    pub fn ignored(mut self) -> Self {
        self.entry.ignored = true;
        self
    }

    /// Sets the run kind.
    pub fn kind(mut self, kind: RunKind) -> Self {
        self.entry.run_kind = kind;
        self
    }

    /// Sets the run time.
    pub fn run_time(mut self, run_time: DateTime<Utc>) -> Self {
        self.entry.run_time = run_time;
        self
    }

    /// Sets the monitor.
    pub fn monitor(mut self, monitor: &str) -> Self {
        self.entry.monitor = monitor.to_string();
        self
    }

    /// Builds the `HistoryEntry`.
    pub fn build(self) -> HistoryEntry {
        self.entry
    }
}
