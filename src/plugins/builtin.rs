//! The plugins that ship with the crate.

use super::registration::PluginRegistration;
use crate::{
    loaders::DatabaseLoader,
    validators::{ExpectColumnValuesToNotBeNull, ExpectRowCountToBeBetween},
};

/// Origin recorded for every built-in plugin.
pub const BUILTIN_ORIGIN: &str = "watchtower::builtin";

/// Registrations for the built-in validators and loaders.
pub(crate) fn registrations() -> Vec<PluginRegistration> {
    vec![
        PluginRegistration::validator::<ExpectColumnValuesToNotBeNull>(BUILTIN_ORIGIN),
        PluginRegistration::validator::<ExpectRowCountToBeBetween>(BUILTIN_ORIGIN),
        PluginRegistration::loader::<DatabaseLoader>(BUILTIN_ORIGIN),
    ]
}
