//! Persisted run history as read back by the status aggregator.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a history row describes a whole run or a single validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    /// A watchtower run.
    Run,
    /// One validator inside a run.
    Validator,
}

impl RunKind {
    /// Storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Run => "run",
            RunKind::Validator => "validator",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run" => Ok(RunKind::Run),
            "validator" => Ok(RunKind::Validator),
            other => Err(format!("unknown run kind '{other}'")),
        }
    }
}

/// One stored outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Storage row id; later rows have larger ids.
    pub id: i64,

    /// Groups the run row with its validator rows.
    pub run_id: String,

    /// The watchtower's name template.
    pub monitor: String,

    /// Resolved watchtower name for runs, validator name for validators.
    pub name: String,

    /// Row kind.
    pub run_kind: RunKind,

    /// Stored success flag.
    pub success: bool,

    /// Ignored rows do not count towards the monitor status.
    pub ignored: bool,

    /// When the run or validator finished.
    pub run_time: DateTime<Utc>,
}

/// The rolled-up status of a monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    /// The watchtower's name template.
    pub monitor: String,

    /// Rolled-up success; `None` until first computed.
    pub success: Option<bool>,

    /// When the status was last computed.
    pub computed_at: Option<DateTime<Utc>>,
}
