//! Typed records.
//!
//! A [`Record`] is a JSON object that has been validated against a schema.
//! Records can only be built through validation, so holding one is proof
//! that its values conform to [`Record::schema`].

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{Schema, SchemaRef};
use crate::types::value_kind;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// A value conforming to a [`Schema`].
#[derive(Clone)]
pub struct Record {
    schema: SchemaRef,
    values: Map<String, Value>,
}

impl Record {
    /// Validate `values` against `schema`.
    pub fn new(schema: &SchemaRef, values: Map<String, Value>) -> SchemaResult<Self> {
        let values = schema.conform_object(values)?;
        Ok(Self {
            schema: schema.clone(),
            values,
        })
    }

    /// Validate a JSON value, which must be an object.
    pub fn from_value(schema: &SchemaRef, value: Value) -> SchemaResult<Self> {
        match value {
            Value::Object(values) => Self::new(schema, values),
            other => Err(SchemaError::NotAnObject {
                schema: schema.name().to_string(),
                found: value_kind(&other).to_string(),
            }),
        }
    }

    /// Serialize a Rust value and validate it against `schema`.
    pub fn from_serialize<T: Serialize>(schema: &SchemaRef, value: &T) -> SchemaResult<Self> {
        Self::from_value(schema, serde_json::to_value(value)?)
    }

    /// Deserialize the record's values into a Rust type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> SchemaResult<T> {
        Ok(serde_json::from_value(self.to_value())?)
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.values
    }

    /// The record as a plain JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Returns true if this record's schema is `schema` or derives from it.
    pub fn is_instance_of(&self, schema: &Schema) -> bool {
        self.schema.is_subtype_of(schema)
    }

    /// Revalidate the record's values against another schema.
    pub fn conform_to(&self, schema: &SchemaRef) -> SchemaResult<Record> {
        if self.schema == *schema {
            return Ok(self.clone());
        }
        Record::new(schema, self.values.clone())
    }

    /// Number of fields holding something other than null or `""`.
    pub fn active_fields(&self) -> usize {
        self.values.values().filter(|v| !is_empty_value(v)).count()
    }

    /// Fraction of schema fields holding something other than null or `""`.
    ///
    /// A schema without fields scores `0.0`.
    pub fn fraction_non_empty(&self) -> f64 {
        let total = self.schema.len();
        if total == 0 {
            return 0.0;
        }
        self.active_fields() as f64 / total as f64
    }

    /// Render the record as a markdown bullet list.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("### {}\n", self.schema.name());
        for (name, value) in &self.values {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out.push_str(&format!("- **{name}**: {rendered}\n"));
        }
        out
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.schema.name(), Value::Object(self.values.clone()))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.values.clone()))
    }
}
