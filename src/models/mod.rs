//! Data types shared across the watchtower pipeline.

pub mod dataset;
pub mod history;
pub mod run_record;
pub mod watchtower;

pub use dataset::{Dataset, DatasetError};
pub use history::{HistoryEntry, MonitorStatus, RunKind};
pub use run_record::{RunRecord, ValidatorResult};
pub use watchtower::{LoaderSpec, Params, SuccessPolicy, ValidatorSpec, WatchtowerConfig};
