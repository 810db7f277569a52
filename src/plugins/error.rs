//! Errors raised by the plugin registry.

use thiserror::Error;

use super::PluginKind;

/// Errors that can occur while building or using the plugin registry.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Two plugins of the same kind share a name.
    #[error("Duplicate {kind} name '{name}' (registered by '{first}' and '{second}')")]
    DuplicateRegistration {
        /// Validator or loader.
        kind: PluginKind,
        /// The contested name.
        name: String,
        /// Origin of the plugin registered first.
        first: String,
        /// Origin of the conflicting plugin.
        second: String,
    },

    /// A spec references a plugin that is not registered.
    #[error("Unknown {kind} '{name}'")]
    UnknownPlugin {
        /// Validator or loader.
        kind: PluginKind,
        /// The requested name.
        name: String,
    },

    /// The params map could not be turned into the plugin's parameters.
    #[error("Invalid parameters for {kind} '{name}': {reason}")]
    InvalidParams {
        /// Validator or loader.
        kind: PluginKind,
        /// Plugin name.
        name: String,
        /// Deserialization failure.
        reason: String,
    },

    /// The discovery collaborator failed to walk a location.
    #[error("Plugin discovery failed for location '{location}': {reason}")]
    Discovery {
        /// The location being walked.
        location: String,
        /// Failure description.
        reason: String,
    },

    /// A plugin's schema could not be produced.
    #[error("Failed to build schema for {kind} '{name}': {reason}")]
    Schema {
        /// Validator or loader.
        kind: PluginKind,
        /// Plugin name.
        name: String,
        /// Failure description.
        reason: String,
    },
}
