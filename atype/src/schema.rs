//! Schema IR.
//!
//! A [`Schema`] is a named, ordered list of typed fields. Schemas are
//! immutable once built and are shared through [`SchemaRef`], which compares
//! and hashes by the schema's process-unique [`SchemaId`] rather than by
//! structure: two independently built schemas with identical fields are
//! different schemas.
//!
//! # Example
//! ```rust,ignore
//! use atype::{Field, FieldType, Schema};
//!
//! let email = Schema::builder("Email")
//!     .description("An outgoing email")
//!     .field(Field::required("to", FieldType::String))
//!     .field(Field::optional("body", FieldType::optional(FieldType::String)))
//!     .build()?;
//! ```

use crate::error::{SchemaError, SchemaResult};
use crate::record::Record;
use crate::types::FieldType;
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique schema identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u64);

impl SchemaId {
    fn next() -> Self {
        Self(NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name (a valid identifier)
    pub name: String,
    /// Field type
    pub ty: FieldType,
    /// Whether the field may be absent from a record
    pub optional: bool,
    /// Value used when an optional field is absent (null when `None`)
    pub default: Option<Value>,
    /// Human-readable description
    pub description: Option<String>,
}

impl Field {
    /// A field that every record must carry.
    pub fn required(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            default: None,
            description: None,
        }
    }

    /// A field that defaults to null when absent.
    pub fn optional(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            optional: true,
            ..Self::required(name, ty)
        }
    }

    /// Makes the field optional with the given default.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.optional = true;
        self.default = Some(default);
        self
    }

    /// Sets the field description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Value stored when the field is absent.
    pub fn default_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }

    /// Returns true if an explicit null is acceptable for this field.
    pub fn accepts_null(&self) -> bool {
        self.ty.is_nullable() || (self.optional && self.default.as_ref().is_none_or(Value::is_null))
    }
}

/// How a schema came to exist.
#[derive(Debug, Clone, Default)]
pub enum Lineage {
    /// Built directly
    #[default]
    Declared,
    /// Union of two schemas, in canonical order
    Merged(SchemaRef, SchemaRef),
    /// Every field of the parent made optional
    Optional(SchemaRef),
    /// Field subset of the parent
    Projected(SchemaRef),
}

/// A named, ordered, immutable record definition.
#[derive(Debug)]
pub struct Schema {
    id: SchemaId,
    name: String,
    description: Option<String>,
    fields: Vec<Field>,
    lineage: Lineage,
}

impl Schema {
    /// Start building a schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if records of this schema are instances of `other`.
    ///
    /// A schema is a subtype of itself and of whatever its lineage derives
    /// from it: a merge is a subtype of both parents, and a schema is a
    /// subtype of its optional view and of its projections.
    pub fn is_subtype_of(&self, other: &Schema) -> bool {
        if self.id == other.id {
            return true;
        }
        if let Lineage::Merged(a, b) = &self.lineage {
            if a.is_subtype_of(other) || b.is_subtype_of(other) {
                return true;
            }
        }
        match &other.lineage {
            Lineage::Optional(base) | Lineage::Projected(base) => self.is_subtype_of(base),
            _ => false,
        }
    }

    /// Validate a field map against this schema.
    ///
    /// Unknown fields are rejected, absent optional fields take their
    /// default, and the result follows the schema's field order.
    pub fn conform_object(&self, mut values: Map<String, Value>) -> SchemaResult<Map<String, Value>> {
        if let Some(unknown) = values.keys().find(|k| self.field(k).is_none()) {
            return Err(SchemaError::UnknownField {
                schema: self.name.clone(),
                field: unknown.clone(),
            });
        }

        let mut out = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match values.remove(&field.name) {
                Some(Value::Null) if field.accepts_null() => Value::Null,
                Some(value) => field.ty.conform(&self.name, &field.name, value)?,
                None if field.optional => field.default_value(),
                None => {
                    return Err(SchemaError::MissingField {
                        schema: self.name.clone(),
                        field: field.name.clone(),
                    });
                }
            };
            out.insert(field.name.clone(), value);
        }
        Ok(out)
    }

    /// JSON Schema document describing this schema.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut property = field.ty.to_json_schema();
            if let Value::Object(obj) = &mut property {
                if let Some(description) = &field.description {
                    obj.insert("description".into(), Value::String(description.clone()));
                }
                if let Some(default) = &field.default {
                    obj.insert("default".into(), default.clone());
                }
            }
            if !field.optional {
                required.push(Value::String(field.name.clone()));
            }
            properties.insert(field.name.clone(), property);
        }

        let mut doc = Map::new();
        doc.insert("title".into(), Value::String(self.name.clone()));
        if let Some(description) = &self.description {
            doc.insert("description".into(), Value::String(description.clone()));
        }
        doc.insert("type".into(), Value::String("object".into()));
        doc.insert("properties".into(), Value::Object(properties));
        doc.insert("required".into(), Value::Array(required));
        Value::Object(doc)
    }
}

/// Shared handle to an immutable [`Schema`].
///
/// Equality and hashing use the schema id.
#[derive(Clone)]
pub struct SchemaRef(Arc<Schema>);

impl SchemaRef {
    /// Build a record of this schema from a JSON object.
    pub fn record(&self, values: Value) -> SchemaResult<Record> {
        Record::from_value(self, values)
    }

    /// A record with every optional field at its default.
    pub fn empty_record(&self) -> SchemaResult<Record> {
        Record::new(self, Map::new())
    }

    /// Returns true if both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &SchemaRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for SchemaRef {
    type Target = Schema;

    fn deref(&self) -> &Schema {
        &self.0
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for SchemaRef {}

impl Hash for SchemaRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.name, self.0.id)
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    description: Option<String>,
    fields: Vec<Field>,
    lineage: Lineage,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            lineage: Lineage::Declared,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn maybe_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub(crate) fn lineage(mut self, lineage: Lineage) -> Self {
        self.lineage = lineage;
        self
    }

    /// Validate names and defaults, then allocate a new schema identity.
    pub fn build(self) -> SchemaResult<SchemaRef> {
        validate_identifier(&self.name)?;

        for (i, field) in self.fields.iter().enumerate() {
            validate_identifier(&field.name)?;
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    schema: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if let Some(default) = &field.default {
                if !(default.is_null() && field.accepts_null()) {
                    field.ty.conform(&self.name, &field.name, default.clone())?;
                }
            }
        }

        Ok(SchemaRef(Arc::new(Schema {
            id: SchemaId::next(),
            name: self.name,
            description: self.description,
            fields: self.fields,
            lineage: self.lineage,
        })))
    }
}

/// Returns true if `name` is a valid schema or field identifier.
///
/// Identifiers start with a letter or underscore and continue with letters,
/// digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn validate_identifier(name: &str) -> SchemaResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier(name.to_string()))
    }
}
