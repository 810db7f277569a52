//! # Macro Engine
//!
//! Configuration strings (watchtower names, loader queries, validator
//! parameters) may reference macros as `${name}` or `$name`. A macro is either
//! a static JSON value or a zero-argument producer that is invoked every time
//! it is resolved, so `${today}` always tracks the wall clock.
//!
//! Resolution is driven by usage: only macros that some input string actually
//! references are evaluated. Substitution is lenient, a reference to a macro
//! that was not resolved is left in the output as literal text.

mod defaults;

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    sync::{Arc, LazyLock},
};

use regex::{Captures, Regex};
use serde_json::Value;

pub use defaults::default_macros;

use crate::error::ConfigurationError;

const NAME_PATTERN: &str = r"[_A-Za-z][_:A-Za-z0-9]*";

/// Matches `$$`, `${name}` and `$name`, in that order of precedence.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\$(?:(\$)|\{{({NAME_PATTERN})\}}|({NAME_PATTERN}))"))
        .expect("macro token pattern is valid")
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{NAME_PATTERN}$")).expect("macro name pattern is valid")
});

/// A function producing a macro value on demand.
pub type Producer = Arc<dyn Fn() -> Value + Send + Sync>;

/// The value side of a macro definition.
#[derive(Clone)]
pub enum MacroValue {
    /// A fixed value.
    Static(Value),
    /// Evaluated on every resolution, never cached.
    Producer(Producer),
}

impl fmt::Debug for MacroValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            MacroValue::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// A named macro definition.
#[derive(Debug, Clone)]
pub struct MacroSpec {
    name: String,
    value: MacroValue,
    description: Option<String>,
}

impl MacroSpec {
    /// Creates a macro with a fixed value.
    pub fn fixed(name: &str, value: impl Into<Value>) -> Result<Self, ConfigurationError> {
        Self::new(name, MacroValue::Static(value.into()))
    }

    /// Creates a macro whose value is produced on each resolution.
    pub fn producer<F>(name: &str, producer: F) -> Result<Self, ConfigurationError>
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::new(name, MacroValue::Producer(Arc::new(producer)))
    }

    fn new(name: &str, value: MacroValue) -> Result<Self, ConfigurationError> {
        if !is_valid_macro_name(name) {
            return Err(ConfigurationError::InvalidMacroName(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            value,
            description: None,
        })
    }

    /// Attaches a human readable description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// The macro name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The fixed value, or `None` for producers.
    pub fn static_value(&self) -> Option<&Value> {
        match &self.value {
            MacroValue::Static(value) => Some(value),
            MacroValue::Producer(_) => None,
        }
    }

    /// Evaluates the macro now.
    pub fn resolve(&self) -> Value {
        match &self.value {
            MacroValue::Static(value) => value.clone(),
            MacroValue::Producer(producer) => producer(),
        }
    }
}

/// A lookup table of macro definitions by name.
#[derive(Debug, Clone, Default)]
pub struct MacroRegistry {
    specs: HashMap<String, MacroSpec>,
}

impl MacroRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a definition.
    pub fn insert(&mut self, spec: MacroSpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    /// Returns a new registry with `overrides` layered on top of `self`.
    /// Neither input is modified.
    pub fn merged_with(&self, overrides: &MacroRegistry) -> MacroRegistry {
        let mut specs = self.specs.clone();
        for (name, spec) in &overrides.specs {
            specs.insert(name.clone(), spec.clone());
        }
        MacroRegistry { specs }
    }

    /// Looks up a definition by name.
    pub fn get(&self, name: &str) -> Option<&MacroSpec> {
        self.specs.get(name)
    }

    /// Whether a definition with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Iterates over all definitions in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &MacroSpec> {
        self.specs.values()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the registry has no definitions.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl FromIterator<MacroSpec> for MacroRegistry {
    fn from_iter<I: IntoIterator<Item = MacroSpec>>(iter: I) -> Self {
        let mut registry = MacroRegistry::new();
        for spec in iter {
            registry.insert(spec);
        }
        registry
    }
}

/// Resolved macro values for a single run, keyed by name.
pub type MacroSet = BTreeMap<String, Value>;

/// Whether `name` is a legal macro name.
pub fn is_valid_macro_name(name: &str) -> bool {
    NAME_RE.is_match(name)
}

/// Returns every distinct macro name referenced in `text`, registered or not.
pub fn extract_macro_names(text: &str) -> BTreeSet<String> {
    TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Evaluates a single macro definition.
pub fn resolve(spec: &MacroSpec) -> Value {
    spec.resolve()
}

/// Resolves the macros of `registry` referenced by any of `strings`.
///
/// Names that are referenced but not registered are dropped; macros that are
/// registered but never referenced are not evaluated.
pub fn collect_used_macros<I, S>(strings: I, registry: &MacroRegistry) -> MacroSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut used = BTreeSet::new();
    for string in strings {
        used.extend(extract_macro_names(string.as_ref()));
    }

    used
        .into_iter()
        .filter_map(|name| registry.get(&name).map(|spec| (name, spec.resolve())))
        .collect()
}

/// Replaces every resolved macro reference in `text` with its value.
///
/// References to names missing from `resolved` are kept verbatim and `$$`
/// collapses to `$`.
pub fn substitute(text: &str, resolved: &MacroSet) -> String {
    TOKEN_RE
        .replace_all(text, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                return "$".to_string();
            }
            let name = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match resolved.get(name) {
                Some(value) => value_to_text(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Renders a macro value the way it appears inside a substituted string.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Collects every string found in `value`, descending into arrays and objects.
pub fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

/// Returns a copy of `value` with macros substituted into every string.
pub fn substitute_value(value: &Value, resolved: &MacroSet) -> Value {
    match value {
        Value::String(s) => Value::String(substitute(s, resolved)),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| substitute_value(item, resolved)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter().map(|(k, v)| (k.clone(), substitute_value(v, resolved))).collect(),
        ),
        other => other.clone(),
    }
}
