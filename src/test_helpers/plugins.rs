//! Plugin doubles: validators with a fixed outcome and loaders that return a
//! canned dataset.

use async_trait::async_trait;
use serde_json::json;

use crate::{
    loaders::{DataLoader, LoadError},
    models::{Dataset, Params},
    plugins::{PluginRegistration, StaticDiscovery},
    validators::{ValidationOutcome, Validator, ValidatorError},
};

/// A validator that always reports the same outcome.
#[derive(Debug, Clone)]
pub struct FixedValidator {
    success: bool,
}

impl FixedValidator {
    /// Creates a validator reporting `success`.
    pub fn new(success: bool) -> Self {
        Self { success }
    }
}

impl Validator for FixedValidator {
    fn validate(&self, data: &Dataset) -> Result<ValidationOutcome, ValidatorError> {
        let mut metrics = Params::new();
        metrics.insert("rows".to_string(), json!(data.row_count()));
        Ok(ValidationOutcome {
            success: self.success,
            metrics,
        })
    }
}

/// A loader that returns a copy of a fixed dataset.
#[derive(Debug, Clone)]
pub struct StaticLoader {
    data: Dataset,
}

impl StaticLoader {
    /// Creates a loader returning `data`.
    pub fn new(data: Dataset) -> Self {
        Self { data }
    }
}

#[async_trait]
impl DataLoader for StaticLoader {
    async fn load(&self) -> Result<Dataset, LoadError> {
        Ok(self.data.clone())
    }
}

struct FailingLoader;

#[async_trait]
impl DataLoader for FailingLoader {
    async fn load(&self) -> Result<Dataset, LoadError> {
        Err(LoadError::Source("source unavailable".to_string()))
    }
}

struct RaisingValidator;

impl Validator for RaisingValidator {
    fn validate(&self, _data: &Dataset) -> Result<ValidationOutcome, ValidatorError> {
        Err(ValidatorError::Failed("validator raised".to_string()))
    }
}

/// A validator registration whose instances report `success`.
pub fn fixed_validator_registration(name: &str, origin: &str, success: bool) -> PluginRegistration {
    PluginRegistration::validator_fn(
        name,
        origin,
        move |_| Ok(Box::new(FixedValidator::new(success)) as Box<dyn Validator>),
        || Ok(Vec::new()),
    )
}

/// A validator registration that always passes.
pub fn noop_validator_registration(name: &str, origin: &str) -> PluginRegistration {
    fixed_validator_registration(name, origin, true)
}

/// A validator registration whose instances return an error.
pub fn failing_validator_registration(name: &str, origin: &str) -> PluginRegistration {
    PluginRegistration::validator_fn(
        name,
        origin,
        |_| Ok(Box::new(RaisingValidator) as Box<dyn Validator>),
        || Ok(Vec::new()),
    )
}

/// A loader registration returning `data` regardless of params.
pub fn static_loader_registration(name: &str, origin: &str, data: Dataset) -> PluginRegistration {
    PluginRegistration::loader_fn(
        name,
        origin,
        move |_| Ok(Box::new(StaticLoader::new(data.clone())) as Box<dyn DataLoader>),
        || Ok(Vec::new()),
    )
}

/// A loader registration whose instances fail to load.
pub fn failing_loader_registration(name: &str, origin: &str) -> PluginRegistration {
    PluginRegistration::loader_fn(
        name,
        origin,
        |_| Ok(Box::new(FailingLoader) as Box<dyn DataLoader>),
        || Ok(Vec::new()),
    )
}

/// A discovery declaring, under location `test`: validators `always_pass`,
/// `always_fail` and `raises`, and loaders `static_loader` (returning `data`)
/// and `broken_loader`.
pub fn test_discovery(data: Dataset) -> StaticDiscovery {
    StaticDiscovery::new()
        .with(fixed_validator_registration("always_pass", "test", true))
        .with(fixed_validator_registration("always_fail", "test", false))
        .with(failing_validator_registration("raises", "test"))
        .with(static_loader_registration("static_loader", "test", data))
        .with(failing_loader_registration("broken_loader", "test"))
}
