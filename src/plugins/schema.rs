//! Machine-readable descriptions of plugin parameters, used to render
//! configuration forms.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::PluginKind;

/// The JSON type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Text.
    String,
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Nested object.
    Object,
    /// List.
    Array,
}

/// One declared parameter of a plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamField {
    /// Parameter name as it appears in the params map.
    pub name: String,
    /// Expected type.
    #[serde(rename = "type")]
    pub ty: ParamType,
    /// Whether the parameter must be given.
    pub required: bool,
    /// Value used when the parameter is omitted.
    pub default: Option<Value>,
    /// Help text.
    pub description: Option<String>,
    /// Other names the plugin accepts for this parameter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ParamField {
    /// A required parameter.
    pub fn required(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: true,
            default: None,
            description: None,
            aliases: Vec::new(),
        }
    }

    /// An optional parameter with the given default (`Value::Null` for "none").
    pub fn optional(name: &str, ty: ParamType, default: Value) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: false,
            default: Some(default),
            description: None,
            aliases: Vec::new(),
        }
    }

    /// Sets the help text.
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds an alternative name for the parameter.
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }
}

/// The full parameter description of one plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginSchema {
    /// Registered plugin name.
    pub name: String,
    /// Validator or loader.
    pub kind: PluginKind,
    /// Declared parameters in declaration order.
    pub params: Vec<ParamField>,
}

impl PluginSchema {
    /// Renders the schema as a JSON-schema object.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.params {
            let mut property = Map::new();
            property.insert("title".into(), json!(field.name));
            property.insert("type".into(), json!(field.ty));
            if let Some(default) = &field.default {
                property.insert("default".into(), default.clone());
            }
            if let Some(description) = &field.description {
                property.insert("description".into(), json!(description));
            }
            if field.required {
                required.push(json!(field.name));
            }
            for alias in &field.aliases {
                properties.insert(
                    alias.clone(),
                    json!({
                        "title": alias,
                        "type": field.ty,
                        "description": format!("Alias of `{}`", field.name),
                    }),
                );
            }
            properties.insert(field.name.clone(), Value::Object(property));
        }

        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}
