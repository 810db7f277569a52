//! The name-indexed table of validators and data loaders.

use std::collections::{BTreeMap, btree_map::Entry};

use super::{
    PluginKind, builtin,
    discovery::PluginDiscovery,
    error::PluginError,
    registration::{Constructor, PluginRegistration},
    schema::PluginSchema,
};
use crate::{loaders::DataLoader, models::Params, validators::Validator};

/// Validators and loaders indexed by name. Read-only once built.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    validators: BTreeMap<String, PluginRegistration>,
    loaders: BTreeMap<String, PluginRegistration>,
}

impl PluginRegistry {
    /// Builds the registry from the built-in plugins followed by every
    /// plugin `discovery` finds in `locations`, in order.
    ///
    /// A name used by two different plugins of the same kind is a fatal
    /// configuration error.
    pub fn build(
        discovery: &dyn PluginDiscovery,
        locations: &[String],
    ) -> Result<Self, PluginError> {
        let mut registry = Self::default();
        for registration in builtin::registrations() {
            registry.insert(registration)?;
        }

        let mut walked: Vec<&str> = Vec::new();
        for location in locations {
            let found = discovery.discover(location)?;
            if found.is_empty() {
                tracing::warn!(location = %location, "No plugins found in configured location.");
            } else {
                tracing::debug!(location = %location, count = found.len(), "Plugins discovered.");
            }
            for registration in found {
                if !registration.is_declared_in(location) {
                    tracing::debug!(
                        location = %location,
                        name = registration.name(),
                        origin = registration.origin(),
                        "Skipping plugin declared outside the walked location."
                    );
                    continue;
                }
                // Already registered while walking an enclosing location.
                if walked.iter().any(|earlier| registration.is_declared_in(earlier)) {
                    continue;
                }
                registry.insert(registration)?;
            }
            walked.push(location.as_str());
        }

        tracing::info!(
            validators = registry.validators.len(),
            loaders = registry.loaders.len(),
            "Plugin registry built."
        );
        Ok(registry)
    }

    /// A registry holding only the built-in plugins.
    pub fn builtin() -> Result<Self, PluginError> {
        let mut registry = Self::default();
        for registration in builtin::registrations() {
            registry.insert(registration)?;
        }
        Ok(registry)
    }

    fn table_mut(&mut self, kind: PluginKind) -> &mut BTreeMap<String, PluginRegistration> {
        match kind {
            PluginKind::Validator => &mut self.validators,
            PluginKind::Loader => &mut self.loaders,
        }
    }

    fn table(&self, kind: PluginKind) -> &BTreeMap<String, PluginRegistration> {
        match kind {
            PluginKind::Validator => &self.validators,
            PluginKind::Loader => &self.loaders,
        }
    }

    fn insert(&mut self, registration: PluginRegistration) -> Result<(), PluginError> {
        let kind = registration.kind();
        match self.table_mut(kind).entry(registration.name().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(registration);
                Ok(())
            }
            Entry::Occupied(existing) => {
                tracing::error!(
                    kind = %kind,
                    name = registration.name(),
                    first = existing.get().origin(),
                    second = registration.origin(),
                    "Duplicate plugin name."
                );
                Err(PluginError::DuplicateRegistration {
                    kind,
                    name: registration.name().to_string(),
                    first: existing.get().origin().to_string(),
                    second: registration.origin().to_string(),
                })
            }
        }
    }

    /// Looks up a registration.
    pub fn get(&self, kind: PluginKind, name: &str) -> Result<&PluginRegistration, PluginError> {
        self
            .table(kind)
            .get(name)
            .ok_or_else(|| PluginError::UnknownPlugin {
                kind,
                name: name.to_string(),
            })
    }

    /// Whether a plugin of this kind and name is registered.
    pub fn contains(&self, kind: PluginKind, name: &str) -> bool {
        self.table(kind).contains_key(name)
    }

    /// Registered names of one kind, sorted.
    pub fn names(&self, kind: PluginKind) -> Vec<&str> {
        self.table(kind).keys().map(String::as_str).collect()
    }

    /// Instantiates the validator registered as `name`.
    pub fn create_validator(
        &self,
        name: &str,
        params: &Params,
    ) -> Result<Box<dyn Validator>, PluginError> {
        match self.get(PluginKind::Validator, name)?.constructor() {
            Constructor::Validator(constructor) => constructor(params),
            Constructor::Loader(_) => {
                Err(PluginError::UnknownPlugin {
                    kind: PluginKind::Validator,
                    name: name.into(),
                })
            }
        }
    }

    /// Instantiates the loader registered as `name`.
    pub fn create_loader(
        &self,
        name: &str,
        params: &Params,
    ) -> Result<Box<dyn DataLoader>, PluginError> {
        match self.get(PluginKind::Loader, name)?.constructor() {
            Constructor::Loader(constructor) => constructor(params),
            Constructor::Validator(_) => {
                Err(PluginError::UnknownPlugin {
                    kind: PluginKind::Loader,
                    name: name.into(),
                })
            }
        }
    }

    /// The parameter schema of one plugin.
    pub fn schema_of(&self, kind: PluginKind, name: &str) -> Result<PluginSchema, PluginError> {
        self.get(kind, name)?.schema()
    }

    /// Schemas of every plugin of one kind. A plugin whose schema cannot be
    /// produced is logged and reported in place; it never hides the others.
    pub fn schemas(&self, kind: PluginKind) -> Vec<(String, Result<PluginSchema, PluginError>)> {
        self
            .table(kind)
            .iter()
            .map(|(name, registration)| {
                let schema = registration.schema();
                if let Err(e) = &schema {
                    tracing::error!(
                        kind = %kind,
                        name = %name,
                        error = %e,
                        "Failed to get schema."
                    );
                }
                (name.clone(), schema)
            })
            .collect()
    }
}
