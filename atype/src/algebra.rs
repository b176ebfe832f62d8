//! Schema algebra: merge, optional view and projection.
//!
//! [`SchemaAlgebra`] owns the caches that make the algebra idempotent. A
//! merge of the same unordered pair, or the optional view of the same
//! schema, always returns the identical [`SchemaRef`]. Caches are `DashMap`s
//! populated through the entry API, so concurrent callers racing on the same
//! key observe a single winner, and a failed merge never inserts anything.
//!
//! A process-wide instance is available through [`SchemaAlgebra::global`];
//! tests and embedders that need isolation construct their own with
//! [`SchemaAlgebra::new`] and tear it down with [`SchemaAlgebra::clear`].
//!
//! # Example
//! ```rust,ignore
//! use atype::SchemaAlgebra;
//!
//! let algebra = SchemaAlgebra::new();
//! let merged = algebra.merge_schemas(&person, &address)?;
//! assert!(merged.ptr_eq(&algebra.merge_schemas(&address, &person)?));
//! ```

use crate::error::{SchemaError, SchemaResult};
use crate::record::Record;
use crate::schema::{Field, Lineage, Schema, SchemaId, SchemaRef};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

static GLOBAL: OnceLock<Arc<SchemaAlgebra>> = OnceLock::new();

/// Schema algebra service with merge and optional-view caches.
#[derive(Debug, Default)]
pub struct SchemaAlgebra {
    merged: DashMap<(SchemaId, SchemaId), SchemaRef>,
    optional: DashMap<SchemaId, SchemaRef>,
}

impl SchemaAlgebra {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide algebra instance.
    pub fn global() -> Arc<SchemaAlgebra> {
        GLOBAL.get_or_init(|| Arc::new(SchemaAlgebra::new())).clone()
    }

    /// Drop every cached schema.
    pub fn clear(&self) {
        self.merged.clear();
        self.optional.clear();
    }

    /// Number of cached merges.
    pub fn cached_merges(&self) -> usize {
        self.merged.len()
    }

    /// Number of cached optional views.
    pub fn cached_optionals(&self) -> usize {
        self.optional.len()
    }

    /// Check that every field shared by `a` and `b` has the same type.
    pub fn check_compatibility(a: &Schema, b: &Schema) -> SchemaResult<()> {
        for field in b.fields() {
            if let Some(existing) = a.field(&field.name) {
                if existing.ty != field.ty {
                    debug!(
                        left = %a.name(),
                        right = %b.name(),
                        field = %field.name,
                        "Schema merge rejected"
                    );
                    return Err(SchemaError::FieldConflict {
                        left: a.name().to_string(),
                        right: b.name().to_string(),
                        field: field.name.clone(),
                        left_type: existing.ty.to_string(),
                        right_type: field.ty.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Union of two schemas' fields.
    ///
    /// Operands are put in canonical order (older schema first), so the
    /// result is the same object regardless of argument order. On a shared
    /// field the second operand's metadata wins and the field keeps its
    /// position from the first.
    pub fn merge_schemas(&self, a: &SchemaRef, b: &SchemaRef) -> SchemaResult<SchemaRef> {
        if a == b {
            return Ok(a.clone());
        }

        Self::check_compatibility(a, b)?;

        let (first, second) = if a.id() <= b.id() { (a, b) } else { (b, a) };

        match self.merged.entry((first.id(), second.id())) {
            Entry::Occupied(entry) => {
                trace!(merged = %entry.get().name(), "Schema merge cache hit");
                Ok(entry.get().clone())
            }
            Entry::Vacant(slot) => {
                let mut fields: Vec<Field> = first.fields().to_vec();
                for field in second.fields() {
                    match fields.iter_mut().find(|f| f.name == field.name) {
                        Some(existing) => *existing = field.clone(),
                        None => fields.push(field.clone()),
                    }
                }

                let description = second
                    .description()
                    .or(first.description())
                    .map(str::to_string);

                let merged = Schema::builder(format!("{}And{}", first.name(), second.name()))
                    .maybe_description(description)
                    .fields(fields)
                    .lineage(Lineage::Merged(first.clone(), second.clone()))
                    .build()?;

                debug!(
                    left = %first.name(),
                    right = %second.name(),
                    merged = %merged.name(),
                    fields = merged.len(),
                    "Schema merge cached"
                );
                slot.insert(merged.clone());
                Ok(merged)
            }
        }
    }

    /// Merge two records into a record of their merged schema.
    ///
    /// Records are combined in the same canonical order as their schemas, so
    /// on a shared field the value comes from the record whose schema also
    /// supplied the field's metadata. The result does not depend on argument
    /// order. For two records of one schema, `b`'s values win.
    pub fn merge_records(&self, a: &Record, b: &Record) -> SchemaResult<Record> {
        let merged = self.merge_schemas(a.schema(), b.schema())?;
        let (first, second) = if a.schema().id() <= b.schema().id() {
            (a, b)
        } else {
            (b, a)
        };

        let mut values = first.values().clone();
        for (name, value) in second.values() {
            values.insert(name.clone(), value.clone());
        }
        Record::new(&merged, values)
    }

    /// A view of `schema` in which every field may be absent or null.
    ///
    /// Field order, names and descriptions are preserved. Fields that
    /// already accept null keep their type.
    pub fn make_all_fields_optional(&self, schema: &SchemaRef) -> SchemaResult<SchemaRef> {
        match self.optional.entry(schema.id()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(slot) => {
                let fields = schema.fields().iter().map(|field| Field {
                    name: field.name.clone(),
                    ty: field.ty.clone().into_optional(),
                    optional: true,
                    default: None,
                    description: field.description.clone(),
                });

                let optional = Schema::builder(format!("{}Optional", schema.name()))
                    .maybe_description(schema.description().map(str::to_string))
                    .fields(fields)
                    .lineage(Lineage::Optional(schema.clone()))
                    .build()?;

                trace!(schema = %schema.name(), "Optional view cached");
                slot.insert(optional.clone());
                Ok(optional)
            }
        }
    }

    /// A read-only view of `schema` restricted to `names`.
    ///
    /// The view keeps the source schema's field order. The source schema is
    /// not modified.
    pub fn project_fields(&self, schema: &SchemaRef, names: &[&str]) -> SchemaResult<ProjectedSchema> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| schema.field(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::UnknownProjectionFields {
                schema: schema.name().to_string(),
                missing,
            });
        }

        let fields = schema
            .fields()
            .iter()
            .filter(|field| names.contains(&field.name.as_str()))
            .cloned();

        let view = Schema::builder(format!("{}Projected_{}", schema.name(), names.join("_")))
            .maybe_description(schema.description().map(str::to_string))
            .fields(fields)
            .lineage(Lineage::Projected(schema.clone()))
            .build()?;

        Ok(ProjectedSchema {
            view,
            source: schema.clone(),
        })
    }
}

/// Field-subset view of a schema, produced by [`SchemaAlgebra::project_fields`].
#[derive(Debug, Clone)]
pub struct ProjectedSchema {
    view: SchemaRef,
    source: SchemaRef,
}

impl ProjectedSchema {
    /// The projected schema itself.
    pub fn schema(&self) -> &SchemaRef {
        &self.view
    }

    /// The schema the view was taken from.
    pub fn source(&self) -> &SchemaRef {
        &self.source
    }

    /// Project a record of the source schema onto the view.
    pub fn project(&self, record: &Record) -> SchemaResult<Record> {
        if !record.is_instance_of(&self.source) {
            return Err(SchemaError::NotAnInstance {
                schema: self.source.name().to_string(),
                found: record.schema().name().to_string(),
            });
        }
        let values = self
            .view
            .field_names()
            .filter_map(|name| record.get(name).map(|v| (name.to_string(), v.clone())))
            .collect();
        Record::new(&self.view, values)
    }
}

impl Deref for ProjectedSchema {
    type Target = SchemaRef;

    fn deref(&self) -> &SchemaRef {
        &self.view
    }
}

/// [`SchemaAlgebra::merge_schemas`] on the global algebra.
pub fn merge_schemas(a: &SchemaRef, b: &SchemaRef) -> SchemaResult<SchemaRef> {
    SchemaAlgebra::global().merge_schemas(a, b)
}

/// [`SchemaAlgebra::merge_records`] on the global algebra.
pub fn merge_records(a: &Record, b: &Record) -> SchemaResult<Record> {
    SchemaAlgebra::global().merge_records(a, b)
}

/// [`SchemaAlgebra::make_all_fields_optional`] on the global algebra.
pub fn make_all_fields_optional(schema: &SchemaRef) -> SchemaResult<SchemaRef> {
    SchemaAlgebra::global().make_all_fields_optional(schema)
}

/// [`SchemaAlgebra::project_fields`] on the global algebra.
pub fn project_fields(schema: &SchemaRef, names: &[&str]) -> SchemaResult<ProjectedSchema> {
    SchemaAlgebra::global().project_fields(schema, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldType;
    use serde_json::json;

    fn schema(name: &str, fields: &[(&str, FieldType)]) -> SchemaRef {
        Schema::builder(name)
            .fields(
                fields
                    .iter()
                    .map(|(n, ty)| Field::required(*n, ty.clone())),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_merge_with_self_is_identity() {
        let algebra = SchemaAlgebra::new();
        let a = schema("A", &[("x", FieldType::String)]);
        assert!(algebra.merge_schemas(&a, &a).unwrap().ptr_eq(&a));
        assert_eq!(algebra.cached_merges(), 0);
    }

    #[test]
    fn test_merge_name_and_field_order() {
        let algebra = SchemaAlgebra::new();
        let a = schema("Person", &[("name", FieldType::String), ("age", FieldType::Integer)]);
        let b = schema("Address", &[("city", FieldType::String), ("name", FieldType::String)]);

        let merged = algebra.merge_schemas(&b, &a).unwrap();
        assert_eq!(merged.name(), "PersonAndAddress");
        assert_eq!(merged.field_names().collect::<Vec<_>>(), vec!["name", "age", "city"]);
    }

    #[test]
    fn test_merge_second_operand_metadata_wins() {
        let algebra = SchemaAlgebra::new();
        let a = Schema::builder("A")
            .field(Field::required("x", FieldType::String).with_description("from a"))
            .build()
            .unwrap();
        let b = Schema::builder("B")
            .field(Field::required("x", FieldType::String).with_description("from b"))
            .build()
            .unwrap();

        let merged = algebra.merge_schemas(&a, &b).unwrap();
        assert_eq!(merged.field("x").unwrap().description.as_deref(), Some("from b"));
    }

    #[test]
    fn test_merged_schema_is_subtype_of_parents() {
        let algebra = SchemaAlgebra::new();
        let a = schema("A", &[("x", FieldType::String)]);
        let b = schema("B", &[("y", FieldType::Integer)]);
        let c = schema("C", &[("z", FieldType::Boolean)]);

        let ab = algebra.merge_schemas(&a, &b).unwrap();
        let abc = algebra.merge_schemas(&ab, &c).unwrap();
        assert!(ab.is_subtype_of(&a));
        assert!(ab.is_subtype_of(&b));
        assert!(abc.is_subtype_of(&a));
        assert!(!a.is_subtype_of(&ab));
        assert!(ab.is_subtype_of(&algebra.make_all_fields_optional(&a).unwrap()));
    }

    #[test]
    fn test_merge_records_newer_schema_value_wins() {
        let algebra = SchemaAlgebra::new();
        let a = schema("A", &[("x", FieldType::String), ("y", FieldType::Integer)]);
        let b = schema("B", &[("x", FieldType::String), ("z", FieldType::Boolean)]);

        let ra = a.record(json!({ "x": "left", "y": 1 })).unwrap();
        let rb = b.record(json!({ "x": "right", "z": true })).unwrap();

        let merged = algebra.merge_records(&ra, &rb).unwrap();
        assert_eq!(merged.to_value(), json!({ "x": "right", "y": 1, "z": true }));

        let flipped = algebra.merge_records(&rb, &ra).unwrap();
        assert_eq!(flipped, merged);
        assert!(merged.schema().ptr_eq(flipped.schema()));
    }

    #[test]
    fn test_merge_records_follows_field_metadata_owner() {
        let algebra = SchemaAlgebra::new();
        let older = Schema::builder("A")
            .field(Field::optional("x", FieldType::String))
            .build()
            .unwrap();
        let newer = Schema::builder("B")
            .field(Field::required("x", FieldType::String))
            .build()
            .unwrap();

        let ra = older.record(json!({ "x": null })).unwrap();
        let rb = newer.record(json!({ "x": "v" })).unwrap();

        for merged in [
            algebra.merge_records(&ra, &rb).unwrap(),
            algebra.merge_records(&rb, &ra).unwrap(),
        ] {
            assert_eq!(merged.schema().name(), "AAndB");
            assert_eq!(merged.get("x"), Some(&json!("v")));
        }
    }

    #[test]
    fn test_merge_records_of_one_schema_prefers_b() {
        let algebra = SchemaAlgebra::new();
        let a = schema("A", &[("x", FieldType::String)]);

        let left = a.record(json!({ "x": "left" })).unwrap();
        let right = a.record(json!({ "x": "right" })).unwrap();

        let merged = algebra.merge_records(&left, &right).unwrap();
        assert_eq!(merged.get("x"), Some(&json!("right")));
    }

    #[test]
    fn test_optional_view_is_cached_and_keeps_metadata() {
        let algebra = SchemaAlgebra::new();
        let m = Schema::builder("Email")
            .description("An email")
            .field(Field::required("to", FieldType::String).with_description("Recipient"))
            .field(Field::optional("cc", FieldType::optional(FieldType::String)))
            .build()
            .unwrap();

        let optional = algebra.make_all_fields_optional(&m).unwrap();
        assert!(optional.ptr_eq(&algebra.make_all_fields_optional(&m).unwrap()));
        assert_eq!(optional.name(), "EmailOptional");
        assert_eq!(optional.description(), Some("An email"));

        let to = optional.field("to").unwrap();
        assert!(to.optional);
        assert_eq!(to.ty, FieldType::optional(FieldType::String));
        assert_eq!(to.description.as_deref(), Some("Recipient"));
        assert_eq!(
            optional.field("cc").unwrap().ty,
            FieldType::optional(FieldType::String)
        );

        let blank = optional.empty_record().unwrap();
        assert_eq!(blank.to_value(), json!({ "to": null, "cc": null }));
    }

    #[test]
    fn test_projection_is_independent_view() {
        let algebra = SchemaAlgebra::new();
        let m = schema(
            "Email",
            &[("to", FieldType::String), ("subject", FieldType::String), ("body", FieldType::String)],
        );

        let projected = algebra.project_fields(&m, &["body", "to"]).unwrap();
        assert_eq!(projected.name(), "EmailProjected_body_to");
        assert_eq!(projected.field_names().collect::<Vec<_>>(), vec!["to", "body"]);
        assert_eq!(m.len(), 3);
        assert!(matches!(m.lineage(), Lineage::Declared));

        let record = m
            .record(json!({ "to": "a@b.c", "subject": "hi", "body": "hello" }))
            .unwrap();
        assert!(record.is_instance_of(projected.schema()));
        let small = projected.project(&record).unwrap();
        assert_eq!(small.to_value(), json!({ "to": "a@b.c", "body": "hello" }));
    }

    #[test]
    fn test_projection_rejects_unknown_fields() {
        let algebra = SchemaAlgebra::new();
        let m = schema("Email", &[("to", FieldType::String)]);
        let err = algebra.project_fields(&m, &["to", "cc", "bcc"]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownProjectionFields {
                schema: "Email".into(),
                missing: vec!["cc".into(), "bcc".into()],
            }
        );
    }

    #[test]
    fn test_projection_rejects_foreign_records() {
        let algebra = SchemaAlgebra::new();
        let m = schema("Email", &[("to", FieldType::String)]);
        let other = schema("Other", &[("to", FieldType::String)]);
        let projected = algebra.project_fields(&m, &["to"]).unwrap();
        let record = other.record(json!({ "to": "x" })).unwrap();
        assert!(matches!(
            projected.project(&record),
            Err(SchemaError::NotAnInstance { .. })
        ));
    }

    #[test]
    fn test_clear_resets_caches() {
        let algebra = SchemaAlgebra::new();
        let a = schema("A", &[("x", FieldType::String)]);
        let b = schema("B", &[("y", FieldType::String)]);
        let first = algebra.merge_schemas(&a, &b).unwrap();
        algebra.make_all_fields_optional(&a).unwrap();
        assert_eq!((algebra.cached_merges(), algebra.cached_optionals()), (1, 1));

        algebra.clear();
        assert_eq!((algebra.cached_merges(), algebra.cached_optionals()), (0, 0));
        let second = algebra.merge_schemas(&a, &b).unwrap();
        assert!(!first.ptr_eq(&second));
    }
}
