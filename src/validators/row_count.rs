use serde::Deserialize;
use serde_json::{Value, json};

use super::{ValidationOutcome, Validator, ValidatorError};
use crate::{
    config::deserialize_optional_count,
    models::{Dataset, Params},
    plugins::{ParamField, ParamType, PluginParams, ValidatorPlugin},
};

/// Parameters of [`ExpectRowCountToBeBetween`]. Both bounds are inclusive
/// and optional. Numeric strings are accepted so bounds can come from macros.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowCountParams {
    /// Lower bound.
    #[serde(default, alias = "min_rows", deserialize_with = "deserialize_optional_count")]
    pub min_value: Option<u64>,

    /// Upper bound.
    #[serde(default, alias = "max_rows", deserialize_with = "deserialize_optional_count")]
    pub max_value: Option<u64>,
}

impl PluginParams for RowCountParams {
    fn fields() -> Vec<ParamField> {
        vec![
            ParamField::optional("min_value", ParamType::Integer, Value::Null)
                .describe("Minimum number of rows, inclusive")
                .alias("min_rows"),
            ParamField::optional("max_value", ParamType::Integer, Value::Null)
                .describe("Maximum number of rows, inclusive")
                .alias("max_rows"),
        ]
    }
}

/// Passes when the row count lies within the configured bounds.
#[derive(Debug, Clone)]
pub struct ExpectRowCountToBeBetween {
    params: RowCountParams,
}

impl ValidatorPlugin for ExpectRowCountToBeBetween {
    const NAME: &'static str = "expect_row_count_to_be_between";
    type Params = RowCountParams;

    fn from_params(params: Self::Params) -> Self {
        Self { params }
    }
}

impl Validator for ExpectRowCountToBeBetween {
    fn validate(&self, data: &Dataset) -> Result<ValidationOutcome, ValidatorError> {
        let rows = data.row_count() as u64;
        let above_min = self.params.min_value.is_none_or(|min| rows >= min);
        let below_max = self.params.max_value.is_none_or(|max| rows <= max);

        let mut metrics = Params::new();
        metrics.insert("rows".into(), json!(rows));

        Ok(ValidationOutcome {
            success: above_min && below_max,
            metrics,
        })
    }
}
