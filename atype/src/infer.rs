//! Schema construction from sample data and field specifications.

use crate::dsl::parse_type;
use crate::error::SchemaResult;
use crate::registry::SchemaRegistry;
use crate::schema::{Field, Schema, SchemaRef};
use crate::types::FieldType;
use convert_case::{Case, Casing};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;

fn invalid_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("static pattern is valid"))
}

/// Turn an arbitrary key into a field identifier.
///
/// Runs of invalid characters become a single underscore, and names that
/// would start with a digit are prefixed with one.
pub fn sanitize_field_name(name: &str) -> String {
    let cleaned = invalid_chars().replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    match cleaned.chars().next() {
        None => "field".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{cleaned}"),
        Some(_) => cleaned.to_string(),
    }
}

/// Field type that best describes a sample value.
pub fn infer_field_type(value: &Value) -> FieldType {
    match value {
        Value::Null => FieldType::Any,
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(n) if n.is_f64() => FieldType::Float,
        Value::Number(_) => FieldType::Integer,
        Value::String(_) => FieldType::String,
        Value::Array(items) => {
            let mut types = items.iter().map(infer_field_type);
            let element = match types.next() {
                Some(first) if types.all(|ty| ty == first) => first,
                _ => FieldType::Any,
            };
            FieldType::list(element)
        }
        Value::Object(_) => FieldType::map(FieldType::Any),
    }
}

/// Infer an all-optional schema from a sample object.
///
/// The schema name is Pascal-cased and field names are sanitised. Keys that
/// collide after sanitising keep the first occurrence.
pub fn infer_schema(name: &str, sample: &Map<String, Value>) -> SchemaResult<SchemaRef> {
    let mut fields: Vec<Field> = Vec::with_capacity(sample.len());
    for (key, value) in sample {
        let field_name = sanitize_field_name(key);
        if fields.iter().any(|f| f.name == field_name) {
            continue;
        }
        fields.push(Field::optional(field_name, infer_field_type(value).into_optional()));
    }

    Schema::builder(sanitize_field_name(name).to_case(Case::Pascal))
        .fields(fields)
        .build()
}

/// Declarative description of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Type label in schema DSL syntax, e.g. `Vec<String>`
    #[serde(rename = "type")]
    pub type_label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, type_label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_label: type_label.into(),
            description: None,
            required: false,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Build a schema from field specifications.
///
/// Type labels are parsed with the schema DSL; labels it cannot resolve
/// fall back to `Value`. Non-required fields become optional and nullable.
pub fn schema_from_field_specs(
    name: &str,
    specs: &[FieldSpec],
    registry: &SchemaRegistry,
) -> SchemaResult<SchemaRef> {
    let fields = specs.iter().map(|spec| {
        let ty = parse_type(&spec.type_label, registry).unwrap_or(FieldType::Any);
        let field = if spec.required {
            Field::required(spec.name.clone(), ty)
        } else {
            Field::optional(spec.name.clone(), ty.into_optional())
        };
        match &spec.description {
            Some(description) => field.with_description(description.clone()),
            None => field,
        }
    });

    Schema::builder(name).fields(fields).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_field_name() {
        assert_eq!(sanitize_field_name("First Name"), "First_Name");
        assert_eq!(sanitize_field_name("e-mail / address"), "e_mail_address");
        assert_eq!(sanitize_field_name("2nd"), "_2nd");
        assert_eq!(sanitize_field_name("***"), "field");
        assert_eq!(sanitize_field_name("ok_name"), "ok_name");
    }

    #[test]
    fn test_infer_schema_from_sample() {
        let sample = json!({
            "Full Name": "Ada",
            "age": 36,
            "height": 1.7,
            "tags": ["a", "b"],
            "mixed": [1, "x"],
            "meta": { "k": 1 },
            "unknown": null
        });
        let Value::Object(sample) = sample else { unreachable!() };

        let schema = infer_schema("user profile", &sample).unwrap();
        assert_eq!(schema.name(), "UserProfile");
        assert!(schema.fields().iter().all(|f| f.optional));
        assert_eq!(
            schema.field("Full_Name").unwrap().ty,
            FieldType::optional(FieldType::String)
        );
        assert_eq!(
            schema.field("age").unwrap().ty,
            FieldType::optional(FieldType::Integer)
        );
        assert_eq!(
            schema.field("height").unwrap().ty,
            FieldType::optional(FieldType::Float)
        );
        assert_eq!(
            schema.field("tags").unwrap().ty,
            FieldType::optional(FieldType::list(FieldType::String))
        );
        assert_eq!(
            schema.field("mixed").unwrap().ty,
            FieldType::optional(FieldType::list(FieldType::Any))
        );
        assert_eq!(schema.field("unknown").unwrap().ty, FieldType::Any);

        let record = schema.record(json!({ "age": 3 })).unwrap();
        assert_eq!(record.active_fields(), 1);
    }

    #[test]
    fn test_schema_from_field_specs() {
        let specs = vec![
            FieldSpec::new("title", "String").required().with_description("Headline"),
            FieldSpec::new("count", "i32"),
            FieldSpec::new("blob", "not a type"),
        ];
        let schema = schema_from_field_specs("Article", &specs, &SchemaRegistry::new()).unwrap();

        let title = schema.field("title").unwrap();
        assert!(!title.optional);
        assert_eq!(title.description.as_deref(), Some("Headline"));
        assert_eq!(
            schema.field("count").unwrap().ty,
            FieldType::optional(FieldType::Integer)
        );
        assert_eq!(schema.field("blob").unwrap().ty, FieldType::Any);
    }

    #[test]
    fn test_field_spec_deserializes_from_json() {
        let spec: FieldSpec =
            serde_json::from_value(json!({ "name": "x", "type": "Vec<f64>" })).unwrap();
        assert_eq!(spec, FieldSpec::new("x", "Vec<f64>"));
    }
}
