//! Registration entries: how a plugin is named, where it is declared, how it
//! is constructed from a params map and how its parameters are described.

use std::{fmt, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    PluginKind,
    error::PluginError,
    schema::{ParamField, PluginSchema},
};
use crate::{loaders::DataLoader, models::Params, validators::Validator};

/// Builds a validator from its macro-resolved params.
pub type ValidatorConstructor =
    Arc<dyn Fn(&Params) -> Result<Box<dyn Validator>, PluginError> + Send + Sync>;

/// Builds a data loader from its macro-resolved params.
pub type LoaderConstructor =
    Arc<dyn Fn(&Params) -> Result<Box<dyn DataLoader>, PluginError> + Send + Sync>;

/// Describes a plugin's parameters.
pub type SchemaProvider = Arc<dyn Fn() -> Result<Vec<ParamField>, String> + Send + Sync>;

/// A parameter struct that can describe its own fields.
pub trait PluginParams: DeserializeOwned {
    /// The declared fields, in declaration order.
    fn fields() -> Vec<ParamField>;
}

/// A validator type that can be registered by name.
pub trait ValidatorPlugin: Validator + Sized + 'static {
    /// Registered name.
    const NAME: &'static str;

    /// Parameter struct.
    type Params: PluginParams;

    /// Builds the validator from deserialized params.
    fn from_params(params: Self::Params) -> Self;
}

/// A loader type that can be registered by name.
pub trait LoaderPlugin: DataLoader + Sized + 'static {
    /// Registered name.
    const NAME: &'static str;

    /// Parameter struct.
    type Params: PluginParams;

    /// Builds the loader from deserialized params.
    fn from_params(params: Self::Params) -> Self;
}

#[derive(Clone)]
pub(crate) enum Constructor {
    Validator(ValidatorConstructor),
    Loader(LoaderConstructor),
}

/// One entry of the registration table.
#[derive(Clone)]
pub struct PluginRegistration {
    name: String,
    origin: String,
    constructor: Constructor,
    schema: SchemaProvider,
}

fn parse_params<P: DeserializeOwned>(
    kind: PluginKind,
    name: &str,
    params: &Params,
) -> Result<P, PluginError> {
    serde_json::from_value(Value::Object(params.clone())).map_err(|e| {
        PluginError::InvalidParams {
            kind,
            name: name.to_string(),
            reason: e.to_string(),
        }
    })
}

impl PluginRegistration {
    /// Registers validator type `V`, declared at `origin`.
    pub fn validator<V: ValidatorPlugin>(origin: &str) -> Self {
        Self::validator_fn(
            V::NAME,
            origin,
            |params| {
                let parsed = parse_params::<V::Params>(PluginKind::Validator, V::NAME, params)?;
                Ok(Box::new(V::from_params(parsed)) as Box<dyn Validator>)
            },
            || Ok(V::Params::fields()),
        )
    }

    /// Registers loader type `L`, declared at `origin`.
    pub fn loader<L: LoaderPlugin>(origin: &str) -> Self {
        Self::loader_fn(
            L::NAME,
            origin,
            |params| {
                let parsed = parse_params::<L::Params>(PluginKind::Loader, L::NAME, params)?;
                Ok(Box::new(L::from_params(parsed)) as Box<dyn DataLoader>)
            },
            || Ok(L::Params::fields()),
        )
    }

    /// Registers a validator built by an arbitrary constructor.
    pub fn validator_fn<C, S>(name: &str, origin: &str, constructor: C, schema: S) -> Self
    where
        C: Fn(&Params) -> Result<Box<dyn Validator>, PluginError> + Send + Sync + 'static,
        S: Fn() -> Result<Vec<ParamField>, String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            origin: origin.to_string(),
            constructor: Constructor::Validator(Arc::new(constructor)),
            schema: Arc::new(schema),
        }
    }

    /// Registers a loader built by an arbitrary constructor.
    pub fn loader_fn<C, S>(name: &str, origin: &str, constructor: C, schema: S) -> Self
    where
        C: Fn(&Params) -> Result<Box<dyn DataLoader>, PluginError> + Send + Sync + 'static,
        S: Fn() -> Result<Vec<ParamField>, String> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            origin: origin.to_string(),
            constructor: Constructor::Loader(Arc::new(constructor)),
            schema: Arc::new(schema),
        }
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The location the plugin is declared in.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Validator or loader.
    pub fn kind(&self) -> PluginKind {
        match self.constructor {
            Constructor::Validator(_) => PluginKind::Validator,
            Constructor::Loader(_) => PluginKind::Loader,
        }
    }

    /// Whether the plugin is declared in `location` or one of its
    /// sub-locations (`location::...`).
    pub fn is_declared_in(&self, location: &str) -> bool {
        self.origin == location
            || self
                .origin
                .strip_prefix(location)
                .is_some_and(|rest| rest.starts_with("::"))
    }

    pub(crate) fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    /// Describes the plugin's parameters.
    pub fn schema(&self) -> Result<PluginSchema, PluginError> {
        let params = (self.schema)().map_err(|reason| PluginError::Schema {
            kind: self.kind(),
            name: self.name.clone(),
            reason,
        })?;
        Ok(PluginSchema {
            name: self.name.clone(),
            kind: self.kind(),
            params,
        })
    }
}

impl fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistration")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("kind", &self.kind())
            .finish()
    }
}
