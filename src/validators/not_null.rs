use serde::Deserialize;
use serde_json::json;

use super::{ValidationOutcome, Validator, ValidatorError};
use crate::{
    models::{Dataset, Params},
    plugins::{ParamField, ParamType, PluginParams, ValidatorPlugin},
};

/// Parameters of [`ExpectColumnValuesToNotBeNull`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotNullParams {
    /// The column that must not contain nulls.
    pub column: String,
}

impl PluginParams for NotNullParams {
    fn fields() -> Vec<ParamField> {
        vec![
            ParamField::required("column", ParamType::String)
                .describe("Column to check for nulls"),
        ]
    }
}

/// Passes when a column has no null values.
#[derive(Debug, Clone)]
pub struct ExpectColumnValuesToNotBeNull {
    params: NotNullParams,
}

impl ValidatorPlugin for ExpectColumnValuesToNotBeNull {
    const NAME: &'static str = "expect_column_values_to_not_be_null";
    type Params = NotNullParams;

    fn from_params(params: Self::Params) -> Self {
        Self { params }
    }
}

impl Validator for ExpectColumnValuesToNotBeNull {
    fn validate(&self, data: &Dataset) -> Result<ValidationOutcome, ValidatorError> {
        let null_rows = data.null_count(&self.params.column)?;
        let total_rows = data.row_count();

        let mut metrics = Params::new();
        metrics.insert("null_rows".into(), json!(null_rows));
        metrics.insert("total_rows".into(), json!(total_rows));

        Ok(ValidationOutcome {
            success: null_rows == 0,
            metrics,
        })
    }
}
