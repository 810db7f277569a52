//! Errors shared by several modules of the crate.

use thiserror::Error;

/// A configuration value was rejected before any work started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A macro name does not match `[_A-Za-z][_:A-Za-z0-9]*`.
    #[error("Invalid macro name '{0}'")]
    InvalidMacroName(String),

    /// The success policy is neither `all` nor `last`.
    #[error("Unknown success policy '{0}', expected 'all' or 'last'")]
    UnknownSuccessPolicy(String),
}
