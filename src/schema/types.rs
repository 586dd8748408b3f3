//! Structural JSON shapes

use super::validator::{SchemaViolation, Validator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
    /// Any value
    Any,
}

impl JsonType {
    /// Type of a concrete value
    pub fn of(value: &Value) -> JsonType {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonType::Integer,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }

    /// Whether `value` satisfies this type (integers satisfy `number`)
    pub fn matches(&self, value: &Value) -> bool {
        match (self, JsonType::of(value)) {
            (JsonType::Any, _) => true,
            (JsonType::Number, JsonType::Integer) => true,
            (expected, actual) => *expected == actual,
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
            JsonType::Any => write!(f, "any"),
        }
    }
}

/// Structural schema for a JSON value.
///
/// Checks the type, required object keys, declared properties, and array
/// items recursively. Undeclared properties are allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonShape {
    /// Expected type
    #[serde(rename = "type")]
    pub json_type: JsonType,

    /// Whether `null` is also accepted
    #[serde(default)]
    pub nullable: bool,

    /// Keys that must be present (objects only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Shapes of known properties (objects only)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, JsonShape>,

    /// Shape of every item (arrays only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonShape>>,
}

impl JsonShape {
    /// Shape of the given type
    pub fn of(json_type: JsonType) -> Self {
        Self {
            json_type,
            nullable: false,
            required: Vec::new(),
            properties: BTreeMap::new(),
            items: None,
        }
    }

    /// Object shape
    pub fn object() -> Self {
        Self::of(JsonType::Object)
    }

    /// Array shape with the given item shape
    pub fn array_of(items: JsonShape) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(JsonType::Array)
        }
    }

    /// Also accept `null`
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Require a key
    #[must_use]
    pub fn required(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }

    /// Declare a property shape
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, shape: JsonShape) -> Self {
        self.properties.insert(key.into(), shape);
        self
    }

    /// Declare and require a property
    #[must_use]
    pub fn field(self, key: impl Into<String>, shape: JsonShape) -> Self {
        let key = key.into();
        self.required(key.clone()).property(key, shape)
    }

    fn check(&self, value: &Value, path: &str) -> Result<(), SchemaViolation> {
        if value.is_null() && self.nullable {
            return Ok(());
        }
        if !self.json_type.matches(value) {
            return Err(SchemaViolation::new(
                path,
                format!("expected {}, found {}", self.json_type, JsonType::of(value)),
            ));
        }

        match value {
            Value::Object(map) => {
                for key in &self.required {
                    if !map.contains_key(key) {
                        return Err(SchemaViolation::new(
                            path,
                            format!("missing required property '{key}'"),
                        ));
                    }
                }
                for (key, shape) in &self.properties {
                    if let Some(child) = map.get(key) {
                        shape.check(child, &format!("{path}.{key}"))?;
                    }
                }
            }
            Value::Array(items) => {
                if let Some(shape) = &self.items {
                    for (index, item) in items.iter().enumerate() {
                        shape.check(item, &format!("{path}[{index}]"))?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Validator for JsonShape {
    fn validate(&self, input: &Value) -> Result<Value, SchemaViolation> {
        self.check(input, "$")?;
        Ok(input.clone())
    }

    fn name(&self) -> &str {
        "json_shape"
    }
}
