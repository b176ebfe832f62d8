//! Field type IR.
//!
//! [`FieldType`] is the closed set of types a schema field may carry. Types
//! print with the same syntax the schema DSL parses, so a type label in an
//! error message can be pasted back into a schema definition.

use crate::error::{SchemaError, SchemaResult};
use crate::schema::SchemaRef;
use serde_json::{Map, Value};
use std::fmt;

/// The type of a schema field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// UTF-8 text
    String,
    /// `true` / `false`
    Boolean,
    /// Whole number
    Integer,
    /// Any JSON number
    Float,
    /// Unconstrained value
    Any,
    /// Homogeneous list
    List(Box<FieldType>),
    /// String-keyed map
    Map(Box<FieldType>),
    /// Value or null
    Optional(Box<FieldType>),
    /// Nested record of another schema
    Record(SchemaRef),
}

impl FieldType {
    /// `List<inner>`
    pub fn list(inner: FieldType) -> Self {
        Self::List(Box::new(inner))
    }

    /// `Map<String, inner>`
    pub fn map(inner: FieldType) -> Self {
        Self::Map(Box::new(inner))
    }

    /// `Option<inner>`
    pub fn optional(inner: FieldType) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Returns true if null is a valid value of this type.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Optional(_) | Self::Any)
    }

    /// Wraps the type in `Optional` unless it already accepts null.
    pub fn into_optional(self) -> Self {
        if self.is_nullable() {
            self
        } else {
            Self::optional(self)
        }
    }

    /// Checks `value` against this type, returning the value to store.
    ///
    /// Nested records are validated against their schema, which fills in
    /// defaults for absent optional fields.
    pub fn conform(&self, schema: &str, field: &str, value: Value) -> SchemaResult<Value> {
        let mismatch = |value: &Value| SchemaError::TypeMismatch {
            schema: schema.to_string(),
            field: field.to_string(),
            expected: self.to_string(),
            found: value_kind(value).to_string(),
        };

        match self {
            Self::Any => Ok(value),
            Self::Optional(inner) => {
                if value.is_null() {
                    Ok(value)
                } else {
                    inner.conform(schema, field, value)
                }
            }
            Self::String if value.is_string() => Ok(value),
            Self::Boolean if value.is_boolean() => Ok(value),
            Self::Integer if value.is_i64() || value.is_u64() => Ok(value),
            Self::Float if value.is_number() => Ok(value),
            Self::List(inner) => match value {
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| inner.conform(schema, &format!("{field}[{i}]"), item))
                    .collect::<SchemaResult<Vec<_>>>()
                    .map(Value::Array),
                other => Err(mismatch(&other)),
            },
            Self::Map(inner) => match value {
                Value::Object(entries) => {
                    let mut out = Map::with_capacity(entries.len());
                    for (key, item) in entries {
                        let item = inner.conform(schema, &format!("{field}.{key}"), item)?;
                        out.insert(key, item);
                    }
                    Ok(Value::Object(out))
                }
                other => Err(mismatch(&other)),
            },
            Self::Record(nested) => match value {
                Value::Object(entries) => nested.conform_object(entries).map(Value::Object),
                other => Err(mismatch(&other)),
            },
            _ => Err(mismatch(&value)),
        }
    }

    /// JSON Schema fragment for this type.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Self::String => serde_json::json!({ "type": "string" }),
            Self::Boolean => serde_json::json!({ "type": "boolean" }),
            Self::Integer => serde_json::json!({ "type": "integer" }),
            Self::Float => serde_json::json!({ "type": "number" }),
            Self::Any => serde_json::json!({}),
            Self::List(inner) => {
                serde_json::json!({ "type": "array", "items": inner.to_json_schema() })
            }
            Self::Map(inner) => serde_json::json!({
                "type": "object",
                "additionalProperties": inner.to_json_schema()
            }),
            Self::Optional(inner) => serde_json::json!({
                "anyOf": [inner.to_json_schema(), { "type": "null" }]
            }),
            Self::Record(schema) => schema.to_json_schema(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "String"),
            Self::Boolean => write!(f, "bool"),
            Self::Integer => write!(f, "i64"),
            Self::Float => write!(f, "f64"),
            Self::Any => write!(f, "Value"),
            Self::List(inner) => write!(f, "Vec<{inner}>"),
            Self::Map(inner) => write!(f, "HashMap<String, {inner}>"),
            Self::Optional(inner) => write!(f, "Option<{inner}>"),
            Self::Record(schema) => write!(f, "{}", schema.name()),
        }
    }
}

/// Short name of a JSON value's kind, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
