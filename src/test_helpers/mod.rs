//! A set of helpers for testing

mod dataset;
mod history;
mod plugins;
mod watchtower;

use serde_json::Value;

use crate::models::Params;

pub use dataset::DatasetBuilder;
pub use history::HistoryEntryBuilder;
pub use plugins::{
    FixedValidator, StaticLoader, failing_loader_registration, failing_validator_registration,
    fixed_validator_registration, noop_validator_registration, static_loader_registration,
    test_discovery,
};
pub use watchtower::WatchtowerBuilder;

/// Converts a `json!({...})` object into a params map. Non-objects give an
/// empty map.
pub fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}
