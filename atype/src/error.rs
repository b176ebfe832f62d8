//! Error types for schema construction, validation and algebra.

use thiserror::Error;

/// Errors produced while building schemas, validating records or combining
/// schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// Two schemas declare the same field with different types.
    #[error(
        "Cannot merge {left} and {right}: field '{field}' has incompatible types {left_type} vs {right_type}"
    )]
    FieldConflict {
        left: String,
        right: String,
        field: String,
        left_type: String,
        right_type: String,
    },

    /// A projection named fields the schema does not have.
    #[error("Fields {missing:?} not found in {schema}")]
    UnknownProjectionFields {
        schema: String,
        missing: Vec<String>,
    },

    /// A schema or field name is not a valid identifier.
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// A field name was declared twice in one schema.
    #[error("Duplicate field '{field}' in {schema}")]
    DuplicateField { schema: String, field: String },

    /// A required field is absent from a record.
    #[error("{schema}: missing required field '{field}'")]
    MissingField { schema: String, field: String },

    /// A record carries a field its schema does not declare.
    #[error("{schema}: unknown field '{field}'")]
    UnknownField { schema: String, field: String },

    /// A value does not match its field type.
    #[error("{schema}.{field}: expected {expected}, found {found}")]
    TypeMismatch {
        schema: String,
        field: String,
        expected: String,
        found: String,
    },

    /// A record was built from something other than a JSON object.
    #[error("{schema}: expected an object, found {found}")]
    NotAnObject { schema: String, found: String },

    /// A record was handed to a schema it does not derive from.
    #[error("{found} record is not an instance of {schema}")]
    NotAnInstance { schema: String, found: String },

    /// The schema DSL met a type it cannot express.
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// The schema DSL met an item other than a struct definition.
    #[error("Unsupported item in schema source: {0}")]
    UnsupportedItem(String),

    /// A type refers to a schema that has not been registered.
    #[error("Unknown schema reference '{0}'")]
    UnknownReference(String),

    /// Schema source text failed to parse.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Schema source text contained no struct definition.
    #[error("No schema definition found in source")]
    NoDefinition,

    /// Record values could not be converted to or from a Rust type.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<syn::Error> for SchemaError {
    fn from(err: syn::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
