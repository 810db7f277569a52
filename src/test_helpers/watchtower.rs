//! A builder for creating `WatchtowerConfig` instances in tests.

use serde_json::Value;

use crate::models::{LoaderSpec, Params, SuccessPolicy, ValidatorSpec, WatchtowerConfig};

/// A builder for creating `WatchtowerConfig` instances in tests.
///
/// Defaults to the `static_loader` test loader with no validators.
#[derive(Debug, Clone)]
pub struct WatchtowerBuilder {
    config: WatchtowerConfig,
}

impl WatchtowerBuilder {
    /// Starts a definition with the given name template.
    pub fn new(name: &str) -> Self {
        Self {
            config: WatchtowerConfig {
                name: name.to_string(),
                loader: LoaderSpec::new("static_loader", Params::new()),
                validators: Vec::new(),
                macros: Default::default(),
                extra: Params::new(),
                success_policy: SuccessPolicy::All,
            },
        }
    }

    /// Sets the loader.
    pub fn loader(mut self, loader: &str, params: Params) -> Self {
        self.config.loader = LoaderSpec::new(loader, params);
        self
    }

    /// Appends a validator.
    pub fn validator(mut self, validator: &str, params: Params) -> Self {
        self.config.validators.push(ValidatorSpec::new(validator, params));
        self
    }

    /// Adds a static custom macro.
    pub fn macro_value(mut self, name: &str, value: Value) -> Self {
        self.config.macros.insert(name.to_string(), value);
        self
    }

    /// Sets the success policy.
    pub fn policy(mut self, policy: SuccessPolicy) -> Self {
        self.config.success_policy = policy;
        self
    }

    /// Sets the record metadata.
    pub fn extra(mut self, extra: Params) -> Self {
        self.config.extra = extra;
        self
    }

    /// Builds the `WatchtowerConfig`.
    pub fn build(self) -> WatchtowerConfig {
        self.config
    }
}
