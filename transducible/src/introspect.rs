//! Signature introspection.
//!
//! A [`Signature`] is the declared shape of a transducer body: its name,
//! doc, parameters and return annotation. [`introspect`] resolves it into
//! the schemas the transducer works with.
//!
//! Resolution rules:
//! - A parameter annotated with a schema is the Source schema. Any other
//!   annotation is wrapped in a synthesized `{Name}Input` schema.
//! - In reduce mode the parameter must be a list of a schema.
//! - A schema return annotation is the declared Target, and the effective
//!   target is its all-optional view. Any other return type is wrapped in a
//!   synthesized `{Name}Target` schema with a single optional `result`
//!   field; a missing annotation falls back to an untyped `result`.

use crate::config::TransductionMode;
use crate::error::{TransductionError, TransductionResult};
use atype::{Field, FieldType, Schema, SchemaAlgebra, SchemaRef, is_identifier};
use convert_case::{Case, Casing};
use serde_json::Value;

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub annotation: FieldType,
    pub default: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<String>, annotation: FieldType) -> Self {
        Self {
            name: name.into(),
            annotation,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Declared shape of a transducer body.
#[derive(Debug, Clone)]
pub struct Signature {
    pub name: String,
    pub doc: Option<String>,
    pub params: Vec<Param>,
    pub returns: Option<FieldType>,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            returns: None,
        }
    }

    /// `fn name(state: Source) -> Target`
    pub fn unary(name: impl Into<String>, source: &SchemaRef, target: &SchemaRef) -> Self {
        Self::new(name)
            .param("state", FieldType::Record(source.clone()))
            .returns(FieldType::Record(target.clone()))
    }

    /// `fn name(states: Vec<Source>) -> Target`
    pub fn reduce(name: impl Into<String>, source: &SchemaRef, target: &SchemaRef) -> Self {
        Self::new(name)
            .param("states", FieldType::list(FieldType::Record(source.clone())))
            .returns(FieldType::Record(target.clone()))
    }

    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, annotation: FieldType) -> Self {
        self.params.push(Param::new(name, annotation));
        self
    }

    #[must_use]
    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        annotation: FieldType,
        default: Value,
    ) -> Self {
        self.params.push(Param::new(name, annotation).with_default(default));
        self
    }

    #[must_use]
    pub fn returns(mut self, annotation: FieldType) -> Self {
        self.returns = Some(annotation);
        self
    }
}

/// Schemas resolved from a signature.
#[derive(Debug, Clone)]
pub struct ResolvedSchemas {
    /// Schema of input records
    pub source: SchemaRef,
    /// Target as declared (a schema return annotation, or the synthesized one)
    pub declared_target: SchemaRef,
    /// Schema executor output is validated against
    pub target: SchemaRef,
}

/// Resolve the Source and Target schemas of `signature`.
pub fn introspect(
    signature: &Signature,
    mode: TransductionMode,
    algebra: &SchemaAlgebra,
) -> TransductionResult<ResolvedSchemas> {
    if !is_identifier(&signature.name) {
        return Err(TransductionError::declaration(format!(
            "Transducer name '{}' is not a valid identifier",
            signature.name
        )));
    }

    let param = match signature.params.as_slice() {
        [param] => param,
        params => {
            return Err(TransductionError::declaration(format!(
                "Transducible functions must have exactly one argument, '{}' has {}",
                signature.name,
                params.len()
            )));
        }
    };

    let pascal = signature.name.to_case(Case::Pascal);

    let source = match (mode, &param.annotation) {
        (TransductionMode::Map, FieldType::Record(schema)) => schema.clone(),
        (TransductionMode::Map, annotation) => {
            let field = match &param.default {
                Some(default) => Field::optional(&param.name, annotation.clone())
                    .with_default(default.clone()),
                None => Field::required(&param.name, annotation.clone()),
            };
            Schema::builder(format!("{pascal}Input")).field(field).build()?
        }
        (TransductionMode::Reduce, FieldType::List(inner)) => match inner.as_ref() {
            FieldType::Record(schema) => schema.clone(),
            other => return Err(reduce_annotation_error(signature, other)),
        },
        (TransductionMode::Reduce, other) => {
            return Err(reduce_annotation_error(signature, other));
        }
    };

    let (declared_target, target) = match &signature.returns {
        Some(FieldType::Record(schema)) => {
            (schema.clone(), algebra.make_all_fields_optional(schema)?)
        }
        returns => {
            let ty = returns.clone().unwrap_or(FieldType::Any).into_optional();
            let synthesized = Schema::builder(format!("{pascal}Target"))
                .field(Field::optional("result", ty))
                .build()?;
            (synthesized.clone(), synthesized)
        }
    };

    Ok(ResolvedSchemas {
        source,
        declared_target,
        target,
    })
}

fn reduce_annotation_error(signature: &Signature, found: &FieldType) -> TransductionError {
    TransductionError::declaration(format!(
        "Reduce transducer '{}' must take a list of a schema, found {}",
        signature.name, found
    ))
}
