//! # Watchtower
//!
//! A watchtower is one configured monitor: a name template, a data loader and
//! an ordered list of validators. [`Watchtower::run`] executes the pipeline
//! once and returns a [`RunRecord`]; storing it is the caller's job.

mod error;

use chrono::Utc;
use serde_json::{Value, json};

pub use error::RunError;

use crate::{
    error::ConfigurationError,
    macros::{
        MacroRegistry, MacroSet, MacroSpec, collect_strings, collect_used_macros, default_macros,
        extract_macro_names, substitute, substitute_value,
    },
    models::{
        LoaderSpec, Params, RunRecord, SuccessPolicy, ValidatorResult, ValidatorSpec,
        WatchtowerConfig,
    },
    plugins::PluginRegistry,
    validators::Validator,
};

/// A configured monitor.
#[derive(Debug, Clone)]
pub struct Watchtower {
    config: WatchtowerConfig,
    custom_macros: MacroRegistry,
}

fn substitute_params(params: &Params, resolved: &MacroSet) -> Params {
    params.iter().map(|(k, v)| (k.clone(), substitute_value(v, resolved))).collect()
}

impl Watchtower {
    /// Creates a watchtower with no validators, the default policy and no
    /// custom macros.
    pub fn new(name: &str, loader: LoaderSpec) -> Self {
        Self {
            config: WatchtowerConfig {
                name: name.to_string(),
                loader,
                validators: Vec::new(),
                macros: Default::default(),
                extra: Params::new(),
                success_policy: SuccessPolicy::default(),
            },
            custom_macros: MacroRegistry::new(),
        }
    }

    /// Builds a watchtower from its stored definition.
    pub fn from_config(config: WatchtowerConfig) -> Result<Self, ConfigurationError> {
        let custom_macros = config
            .macros
            .iter()
            .map(|(name, value)| MacroSpec::fixed(name, value.clone()))
            .collect::<Result<MacroRegistry, _>>()?;
        Ok(Self {
            config,
            custom_macros,
        })
    }

    /// Appends a validator.
    pub fn with_validator(mut self, spec: ValidatorSpec) -> Self {
        self.config.validators.push(spec);
        self
    }

    /// Adds a custom macro, overriding any default of the same name. Static
    /// macros are also kept in the stored definition.
    pub fn with_macro(mut self, spec: MacroSpec) -> Self {
        if let Some(value) = spec.static_value() {
            self.config.macros.insert(spec.name().to_string(), value.clone());
        } else {
            self.config.macros.remove(spec.name());
        }
        self.custom_macros.insert(spec);
        self
    }

    /// Sets the success policy.
    pub fn with_success_policy(mut self, policy: SuccessPolicy) -> Self {
        self.config.success_policy = policy;
        self
    }

    /// Sets the metadata copied into every run record.
    pub fn with_extra(mut self, extra: Params) -> Self {
        self.config.extra = extra;
        self
    }

    /// The unresolved name template; this is the watchtower's identity.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The stored definition. Producer macros are not part of it.
    pub fn config(&self) -> &WatchtowerConfig {
        &self.config
    }

    /// How run history rolls up into the monitor status.
    pub fn success_policy(&self) -> SuccessPolicy {
        self.config.success_policy
    }

    /// Defaults merged with this watchtower's custom macros.
    pub fn macro_registry(&self) -> MacroRegistry {
        default_macros().merged_with(&self.custom_macros)
    }

    /// Every string that may reference macros: the name template, then all
    /// strings nested in the loader and validator params.
    pub fn referenced_strings(&self) -> Vec<&str> {
        let mut strings = vec![self.config.name.as_str()];
        for value in self.config.loader.params.values() {
            collect_strings(value, &mut strings);
        }
        for validator in &self.config.validators {
            for value in validator.params.values() {
                collect_strings(value, &mut strings);
            }
        }
        strings
    }

    /// Resolves the macros this watchtower references, evaluating producers
    /// now.
    pub fn resolve_macros(&self) -> MacroSet {
        let strings = self.referenced_strings();
        let resolved = collect_used_macros(strings.iter().copied(), &self.macro_registry());

        let unresolved: Vec<String> = strings
            .iter()
            .flat_map(|s| extract_macro_names(s))
            .filter(|name| !resolved.contains_key(name))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        if !unresolved.is_empty() {
            tracing::warn!(
                watchtower = %self.config.name,
                macros = ?unresolved,
                "Macros are referenced but not registered; they are left as-is."
            );
        }

        resolved
    }

    /// Runs the pipeline once: resolve macros, instantiate every plugin,
    /// load, then validate in order. The first error aborts the run.
    #[tracing::instrument(skip(self, registry), fields(watchtower = %self.config.name))]
    pub async fn run(&self, registry: &PluginRegistry) -> Result<RunRecord, RunError> {
        let run_time = Utc::now();
        let macro_maps = self.resolve_macros();
        let name = substitute(&self.config.name, &macro_maps);

        let loader_spec = &self.config.loader;
        let loader_params = substitute_params(&loader_spec.params, &macro_maps);
        let loader = registry.create_loader(&loader_spec.loader, &loader_params)?;

        let validators = self
            .config
            .validators
            .iter()
            .map(|spec| -> Result<_, RunError> {
                let params = substitute_params(&spec.params, &macro_maps);
                let validator = registry.create_validator(&spec.validator, &params)?;
                Ok((spec, params, validator))
            })
            .collect::<Result<Vec<(&ValidatorSpec, Params, Box<dyn Validator>)>, _>>()?;

        tracing::debug!(name = %name, loader = %loader_spec.loader, "Loading data.");
        let data = loader.load().await.map_err(|e| {
            tracing::error!(error = %e, loader = %loader_spec.loader, "Data loading failed.");
            RunError::Load {
                loader: loader_spec.loader.clone(),
                source: e,
            }
        })?;
        tracing::debug!(rows = data.row_count(), "Data loaded.");

        let mut validators_result = Vec::with_capacity(validators.len());
        for (spec, params, validator) in validators {
            let outcome = validator.validate(&data).map_err(|e| {
                tracing::error!(error = %e, validator = %spec.validator, "Validator failed.");
                RunError::Validation {
                    validator: spec.validator.clone(),
                    params: Value::Object(params.clone()),
                    source: e,
                }
            })?;
            tracing::debug!(
                validator = %spec.validator,
                success = outcome.success,
                "Validator finished."
            );
            validators_result.push(ValidatorResult {
                name: spec.validator.clone(),
                run_time: Utc::now(),
                success: outcome.success,
                metrics: outcome.metrics,
                params,
                extra: spec.extra.clone(),
            });
        }

        let failed = validators_result.iter().filter(|r| !r.success).count();
        let mut metrics = Params::new();
        metrics.insert("validator_count".to_string(), json!(validators_result.len()));
        metrics.insert("failed_validators".to_string(), json!(failed));

        tracing::info!(
            name = %name,
            validators = validators_result.len(),
            failed,
            "Run completed."
        );

        Ok(RunRecord {
            monitor: self.config.name.clone(),
            name,
            run_time,
            success: true,
            macro_maps,
            metrics,
            validators_result,
            extra: self.config.extra.clone(),
        })
    }
}
