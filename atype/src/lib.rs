//! # atype
//!
//! Typed record schemas and the algebra used to combine them.
//!
//! ## Features
//!
//! - **Schema IR**: named, ordered, immutable schemas compared by identity
//! - **Records**: JSON objects validated against a schema
//! - **Schema algebra**: cached merge, optional views and field projection
//! - **Schema DSL**: struct declarations parsed without being executed
//! - **Inference**: schemas from sample objects or field specifications
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use atype::{Field, FieldType, Schema, SchemaAlgebra};
//! use serde_json::json;
//!
//! let person = Schema::builder("Person")
//!     .field(Field::required("name", FieldType::String))
//!     .build()?;
//! let address = Schema::builder("Address")
//!     .field(Field::required("city", FieldType::String))
//!     .build()?;
//!
//! let algebra = SchemaAlgebra::new();
//! let merged = algebra.merge_schemas(&person, &address)?;
//! let record = merged.record(json!({ "name": "Ada", "city": "London" }))?;
//! ```

pub mod algebra;
pub mod dsl;
mod error;
pub mod infer;
mod record;
mod registry;
mod schema;
mod types;

#[cfg(test)]
mod tests;

pub use algebra::{
    ProjectedSchema, SchemaAlgebra, make_all_fields_optional, merge_records, merge_schemas,
    project_fields,
};
pub use dsl::{parse_schema, parse_schema_with, parse_type};
pub use error::{SchemaError, SchemaResult};
pub use infer::{FieldSpec, infer_schema, sanitize_field_name, schema_from_field_specs};
pub use record::Record;
pub use registry::SchemaRegistry;
pub use schema::{Field, Lineage, Schema, SchemaBuilder, SchemaId, SchemaRef, is_identifier};
pub use types::{FieldType, value_kind};
