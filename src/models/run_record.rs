//! The output of a single watchtower run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::watchtower::Params;
use crate::macros::MacroSet;

/// The outcome of one validator within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorResult {
    /// Registered validator name.
    pub name: String,

    /// When the validator finished.
    pub run_time: DateTime<Utc>,

    /// Whether the check passed.
    pub success: bool,

    /// Validator-specific measurements.
    pub metrics: Params,

    /// Parameters after macro substitution.
    pub params: Params,

    /// Metadata copied from the validator spec.
    pub extra: Params,
}

/// The immutable record of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// The watchtower's unresolved name template.
    pub monitor: String,

    /// The name after macro substitution, for display.
    pub name: String,

    /// When the run started.
    pub run_time: DateTime<Utc>,

    /// Run-level flag: the pipeline completed. The monitor-level status is
    /// computed separately from stored history.
    pub success: bool,

    /// The macro values used by this run.
    pub macro_maps: MacroSet,

    /// Run-level measurements.
    pub metrics: Params,

    /// One entry per validator, in configuration order.
    pub validators_result: Vec<ValidatorResult>,

    /// Metadata copied from the watchtower.
    pub extra: Params,
}

impl RunRecord {
    /// Whether every validator in this run passed.
    pub fn validators_passed(&self) -> bool {
        self.validators_result.iter().all(|result| result.success)
    }

    /// Names of the validators that failed, in order.
    pub fn failed_validators(&self) -> Vec<&str> {
        self
            .validators_result
            .iter()
            .filter(|result| !result.success)
            .map(|result| result.name.as_str())
            .collect()
    }

    /// Looks up a run-level metric.
    pub fn metric(&self, key: &str) -> Option<&Value> {
        self.metrics.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, success: bool) -> ValidatorResult {
        ValidatorResult {
            name: name.to_string(),
            run_time: Utc::now(),
            success,
            metrics: Params::new(),
            params: Params::new(),
            extra: Params::new(),
        }
    }

    fn record(validators_result: Vec<ValidatorResult>) -> RunRecord {
        RunRecord {
            monitor: "wt".to_string(),
            name: "wt".to_string(),
            run_time: Utc::now(),
            success: true,
            macro_maps: MacroSet::new(),
            metrics: Params::new(),
            validators_result,
            extra: Params::new(),
        }
    }

    #[test]
    fn test_failed_validators_keep_configuration_order() {
        let record = record(vec![
            result("expect_row_count_to_be_between", false),
            result("always_pass", true),
            result("expect_column_values_to_not_be_null", false),
        ]);

        assert!(!record.validators_passed());
        assert_eq!(
            record.failed_validators(),
            vec!["expect_row_count_to_be_between", "expect_column_values_to_not_be_null"]
        );
    }

    #[test]
    fn test_run_without_validators_passes() {
        let record = record(vec![]);
        assert!(record.validators_passed());
        assert!(record.failed_validators().is_empty());
    }
}
