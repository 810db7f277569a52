//! # Plugin Registry
//!
//! Validators and data loaders are plugins: named units of work constructed
//! from a JSON params map.
//!
//! ## Workflow
//!
//! 1. At process start every plugin is described by a
//!    [`PluginRegistration`] and added to a [`StaticDiscovery`] under the
//!    location it is declared in (for example `acme::checks`).
//! 2. The [`RegistryCache`] builds a [`PluginRegistry`] on first use: the
//!    built-in plugins first, then every configured location in order.
//!    Duplicate names abort the build.
//! 3. The watchtower pipeline asks the registry to instantiate loaders and
//!    validators by name; configuration UIs ask it for parameter schemas.

mod builtin;
mod cache;
mod discovery;
pub mod error;
mod registration;
mod registry;
pub mod schema;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use builtin::BUILTIN_ORIGIN;
pub use cache::RegistryCache;
#[cfg(test)]
pub use discovery::MockPluginDiscovery;
pub use discovery::{PluginDiscovery, StaticDiscovery};
pub use error::PluginError;
pub use registration::{
    LoaderConstructor, LoaderPlugin, PluginParams, PluginRegistration, SchemaProvider,
    ValidatorConstructor, ValidatorPlugin,
};
pub use registry::PluginRegistry;
pub use schema::{ParamField, ParamType, PluginSchema};

/// The two plugin capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    /// Checks a dataset.
    Validator,
    /// Produces a dataset.
    Loader,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginKind::Validator => f.write_str("validator"),
            PluginKind::Loader => f.write_str("data loader"),
        }
    }
}
