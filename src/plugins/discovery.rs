//! The discovery collaborator: turns a location string into the plugins
//! declared there.

#[cfg(test)]
use mockall::automock;

use super::{error::PluginError, registration::PluginRegistration};

/// Finds the plugins declared at a location.
#[cfg_attr(test, automock)]
pub trait PluginDiscovery: Send + Sync {
    /// Returns every plugin declared in `location` or any of its
    /// sub-locations. Plugins merely re-exported through `location` are not
    /// returned.
    fn discover(&self, location: &str) -> Result<Vec<PluginRegistration>, PluginError>;
}

/// In-process discovery backed by an explicit registration table.
///
/// Plugins are registered at process start, before the registry is first
/// built.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    registrations: Vec<PluginRegistration>,
}

impl StaticDiscovery {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin to the table.
    pub fn register(&mut self, registration: PluginRegistration) {
        tracing::debug!(
            name = registration.name(),
            origin = registration.origin(),
            kind = %registration.kind(),
            "Plugin registered."
        );
        self.registrations.push(registration);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, registration: PluginRegistration) -> Self {
        self.register(registration);
        self
    }
}

impl PluginDiscovery for StaticDiscovery {
    fn discover(&self, location: &str) -> Result<Vec<PluginRegistration>, PluginError> {
        Ok(self
            .registrations
            .iter()
            .filter(|registration| registration.is_declared_in(location))
            .cloned()
            .collect())
    }
}
