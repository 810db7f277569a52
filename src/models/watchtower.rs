//! Serializable watchtower configuration.

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigurationError;

/// Plugin parameters as a JSON object.
pub type Params = serde_json::Map<String, Value>;

/// Which loader to use and how to configure it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderSpec {
    /// Registered loader name.
    pub loader: String,

    /// Loader parameters. String values may contain macros.
    #[serde(default)]
    pub params: Params,
}

impl LoaderSpec {
    /// Creates a loader spec.
    pub fn new(loader: &str, params: Params) -> Self {
        Self {
            loader: loader.to_string(),
            params,
        }
    }
}

/// One validator in a watchtower's ordered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSpec {
    /// Registered validator name.
    pub validator: String,

    /// Validator parameters. String values may contain macros.
    #[serde(default)]
    pub params: Params,

    /// Opaque metadata copied into the validator's result.
    #[serde(default)]
    pub extra: Params,
}

impl ValidatorSpec {
    /// Creates a validator spec without extra metadata.
    pub fn new(validator: &str, params: Params) -> Self {
        Self {
            validator: validator.to_string(),
            params,
            extra: Params::new(),
        }
    }

    /// Attaches extra metadata.
    pub fn with_extra(mut self, extra: Params) -> Self {
        self.extra = extra;
        self
    }
}

/// How stored run history rolls up into a single monitor status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SuccessPolicy {
    /// Every validator's latest non-ignored result must be successful.
    #[default]
    All,
    /// The most recent run decides.
    Last,
}

impl SuccessPolicy {
    /// The configuration spelling of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            SuccessPolicy::All => "all",
            SuccessPolicy::Last => "last",
        }
    }
}

impl fmt::Display for SuccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuccessPolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SuccessPolicy::All),
            "last" => Ok(SuccessPolicy::Last),
            other => Err(ConfigurationError::UnknownSuccessPolicy(other.to_string())),
        }
    }
}

impl TryFrom<String> for SuccessPolicy {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SuccessPolicy> for String {
    fn from(value: SuccessPolicy) -> Self {
        value.as_str().to_string()
    }
}

/// The stored definition of a watchtower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchtowerConfig {
    /// Name template. The unresolved template is the watchtower's identity.
    pub name: String,

    /// The data loader.
    pub loader: LoaderSpec,

    /// Validators, run in this order.
    ///
    /// The `all` policy keys history by validator name, so two validators of
    /// the same kind would share one latest result. File-loaded definitions
    /// with a repeated validator name are rejected.
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,

    /// Static custom macros; they override defaults with the same name.
    #[serde(default)]
    pub macros: BTreeMap<String, Value>,

    /// Metadata copied into every run record.
    #[serde(default)]
    pub extra: Params,

    /// How run history rolls up into the monitor status.
    #[serde(default)]
    pub success_policy: SuccessPolicy,
}

impl WatchtowerConfig {
    /// The first validator name used more than once, if any.
    pub fn repeated_validator(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self
            .validators
            .iter()
            .map(|spec| spec.validator.as_str())
            .find(|name| !seen.insert(*name))
    }
}
