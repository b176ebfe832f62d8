//! Restricted schema DSL.
//!
//! Schema definitions can be written as plain Rust struct declarations and
//! parsed into the schema IR. The source is parsed with `syn` and never
//! compiled or executed: only `struct` items are accepted, `use` items are
//! skipped, and anything else is an error.
//!
//! Supported field types:
//! - Primitives: `String`, `str`, `bool`, `char`, integers, floats
//! - `Value` / `Any` for unconstrained values
//! - `Option<T>`, `Vec<T>`, `VecDeque<T>`, `HashSet<T>`, `BTreeSet<T>`
//! - `HashMap<String, T>`, `BTreeMap<String, T>`
//! - `Box<T>`, `Arc<T>`, `Rc<T>` (unwrapped)
//! - Slices and arrays (as lists)
//! - Names of previously registered schemas
//!
//! # Example
//! ```rust,ignore
//! use atype::dsl::parse_schema;
//!
//! let schema = parse_schema(r#"
//!     /// A short summary of an email.
//!     struct Summary {
//!         /// One sentence
//!         headline: String,
//!         keywords: Option<Vec<String>>,
//!     }
//! "#)?;
//! ```

use crate::error::{SchemaError, SchemaResult};
use crate::registry::SchemaRegistry;
use crate::schema::{Field, Schema, SchemaRef};
use crate::types::FieldType;
use quote::ToTokens;
use syn::ext::IdentExt;
use syn::{
    Attribute, Expr, ExprLit, Fields, GenericArgument, Item, ItemStruct, Lit, Meta, Path,
    PathArguments, Type,
};

/// Parse schema source with a fresh registry, returning the last struct.
pub fn parse_schema(source: &str) -> SchemaResult<SchemaRef> {
    parse_schema_with(source, &mut SchemaRegistry::new())
}

/// Parse schema source, resolving and registering schemas in `registry`.
///
/// Every struct in the source is registered in declaration order, so later
/// structs may refer to earlier ones. Returns the last struct.
pub fn parse_schema_with(source: &str, registry: &mut SchemaRegistry) -> SchemaResult<SchemaRef> {
    let file = syn::parse_file(source)?;
    let mut last = None;

    for item in &file.items {
        match item {
            Item::Struct(item) => {
                let schema = schema_from_struct(item, registry)?;
                registry.register(schema.clone());
                last = Some(schema);
            }
            Item::Use(_) => {}
            other => return Err(SchemaError::UnsupportedItem(item_kind(other).to_string())),
        }
    }

    last.ok_or(SchemaError::NoDefinition)
}

/// Parse a single type expression such as `Option<Vec<String>>`.
pub fn parse_type(source: &str, registry: &SchemaRegistry) -> SchemaResult<FieldType> {
    let ty: Type = syn::parse_str(source)?;
    field_type(&ty, registry)
}

fn schema_from_struct(item: &ItemStruct, registry: &SchemaRegistry) -> SchemaResult<SchemaRef> {
    let name = item.ident.unraw().to_string();
    if !item.generics.params.is_empty() {
        return Err(SchemaError::UnsupportedType(format!("generic struct {name}")));
    }

    let mut builder = Schema::builder(&name).maybe_description(doc_comment(&item.attrs));

    match &item.fields {
        Fields::Named(named) => {
            for field in &named.named {
                let Some(ident) = &field.ident else {
                    continue;
                };
                let ty = field_type(&field.ty, registry)?;
                let mut schema_field = if matches!(ty, FieldType::Optional(_)) {
                    Field::optional(ident.unraw().to_string(), ty)
                } else {
                    Field::required(ident.unraw().to_string(), ty)
                };
                schema_field.description = doc_comment(&field.attrs);
                builder = builder.field(schema_field);
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => {
            return Err(SchemaError::UnsupportedType(format!("tuple struct {name}")));
        }
    }

    builder.build()
}

fn field_type(ty: &Type, registry: &SchemaRegistry) -> SchemaResult<FieldType> {
    match ty {
        Type::Path(type_path) => {
            if type_path.qself.is_some() {
                return Err(unsupported(ty));
            }
            path_type(&type_path.path, registry)
        }
        Type::Reference(type_ref) => field_type(&type_ref.elem, registry),
        Type::Paren(paren) => field_type(&paren.elem, registry),
        Type::Group(group) => field_type(&group.elem, registry),
        Type::Slice(slice) => Ok(FieldType::list(field_type(&slice.elem, registry)?)),
        Type::Array(array) => Ok(FieldType::list(field_type(&array.elem, registry)?)),
        _ => Err(unsupported(ty)),
    }
}

fn path_type(path: &Path, registry: &SchemaRegistry) -> SchemaResult<FieldType> {
    let segment = path
        .segments
        .last()
        .ok_or_else(|| SchemaError::UnsupportedType("empty path".into()))?;

    let ident = segment.ident.to_string();
    let mut generics = generic_args(&segment.arguments, registry)?;

    let kind = match ident.as_str() {
        "String" | "str" | "char" => FieldType::String,
        "bool" => FieldType::Boolean,
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
        | "u128" | "usize" => FieldType::Integer,
        "f32" | "f64" => FieldType::Float,
        "Value" | "Any" => FieldType::Any,
        "Option" => FieldType::optional(single_generic(&ident, generics)?),
        "Vec" | "VecDeque" | "HashSet" | "BTreeSet" => {
            FieldType::list(single_generic(&ident, generics)?)
        }
        "HashMap" | "BTreeMap" => {
            if generics.len() != 2 {
                return Err(missing_generic(&ident));
            }
            let value = generics.pop().ok_or_else(|| missing_generic(&ident))?;
            let key = generics.pop().ok_or_else(|| missing_generic(&ident))?;
            if key != FieldType::String {
                return Err(SchemaError::UnsupportedType(format!(
                    "{ident} with {key} keys"
                )));
            }
            FieldType::map(value)
        }
        "Box" | "Arc" | "Rc" => single_generic(&ident, generics)?,
        other => registry
            .get(other)
            .cloned()
            .map(FieldType::Record)
            .ok_or_else(|| SchemaError::UnknownReference(other.to_string()))?,
    };

    Ok(kind)
}

fn generic_args(args: &PathArguments, registry: &SchemaRegistry) -> SchemaResult<Vec<FieldType>> {
    match args {
        PathArguments::None => Ok(Vec::new()),
        PathArguments::AngleBracketed(angle) => angle
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(field_type(ty, registry)),
                _ => None,
            })
            .collect(),
        PathArguments::Parenthesized(paren) => Err(SchemaError::UnsupportedType(
            paren.to_token_stream().to_string(),
        )),
    }
}

fn single_generic(ident: &str, generics: Vec<FieldType>) -> SchemaResult<FieldType> {
    let mut generics = generics.into_iter();
    match (generics.next(), generics.next()) {
        (Some(inner), None) => Ok(inner),
        _ => Err(missing_generic(ident)),
    }
}

fn missing_generic(ident: &str) -> SchemaError {
    SchemaError::UnsupportedType(format!("{ident} with missing or extra type parameters"))
}

fn unsupported(ty: &Type) -> SchemaError {
    SchemaError::UnsupportedType(ty.to_token_stream().to_string())
}

fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => Some(s.value().trim().to_string()),
                _ => None,
            },
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

fn item_kind(item: &Item) -> &'static str {
    match item {
        Item::Fn(_) => "fn",
        Item::Impl(_) => "impl",
        Item::Enum(_) => "enum",
        Item::Trait(_) => "trait",
        Item::Mod(_) => "mod",
        Item::Macro(_) => "macro invocation",
        Item::Static(_) => "static",
        Item::Const(_) => "const",
        Item::Type(_) => "type alias",
        Item::Union(_) => "union",
        Item::ExternCrate(_) => "extern crate",
        Item::ForeignMod(_) => "extern block",
        _ => "item",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_struct_with_docs_and_optionals() {
        let schema = parse_schema(
            r#"
            use serde::Deserialize;

            /// A short summary of an email.
            pub struct Summary {
                /// One sentence
                pub headline: String,
                keywords: Option<Vec<String>>,
                score: f64,
            }
            "#,
        )
        .unwrap();

        assert_eq!(schema.name(), "Summary");
        assert_eq!(schema.description(), Some("A short summary of an email."));

        let headline = schema.field("headline").unwrap();
        assert!(!headline.optional);
        assert_eq!(headline.description.as_deref(), Some("One sentence"));

        let keywords = schema.field("keywords").unwrap();
        assert!(keywords.optional);
        assert_eq!(
            keywords.ty,
            FieldType::optional(FieldType::list(FieldType::String))
        );
        assert_eq!(schema.field("score").unwrap().ty, FieldType::Float);
    }

    #[test]
    fn test_later_structs_reference_earlier_ones() {
        let mut registry = SchemaRegistry::new();
        let schema = parse_schema_with(
            r#"
            struct Address { city: String }
            struct Person { name: String, home: Box<Address>, tags: HashMap<String, i32> }
            "#,
            &mut registry,
        )
        .unwrap();

        assert_eq!(registry.len(), 2);
        let address = registry.get("Address").unwrap().clone();
        assert_eq!(schema.field("home").unwrap().ty, FieldType::Record(address));
        assert_eq!(
            schema.field("tags").unwrap().ty,
            FieldType::map(FieldType::Integer)
        );
    }

    #[test]
    fn test_rejects_executable_items() {
        let err = parse_schema("struct A { x: i32 } fn boom() { std::process::exit(1) }")
            .unwrap_err();
        assert_eq!(err, SchemaError::UnsupportedItem("fn".into()));

        let err = parse_schema("impl A { }").unwrap_err();
        assert_eq!(err, SchemaError::UnsupportedItem("impl".into()));
    }

    #[test]
    fn test_rejects_unknown_references_and_bad_maps() {
        assert_eq!(
            parse_schema("struct A { b: B }").unwrap_err(),
            SchemaError::UnknownReference("B".into())
        );
        assert!(matches!(
            parse_schema("struct A { m: HashMap<i32, String> }"),
            Err(SchemaError::UnsupportedType(_))
        ));
        assert!(matches!(
            parse_schema("struct A(String);"),
            Err(SchemaError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_empty_source_has_no_definition() {
        assert_eq!(parse_schema("use std::fmt;").unwrap_err(), SchemaError::NoDefinition);
        assert!(matches!(parse_schema("struct {"), Err(SchemaError::Parse(_))));
    }

    #[test]
    fn test_parse_type_round_trips_display() {
        let registry = SchemaRegistry::new();
        for ty in [
            FieldType::optional(FieldType::list(FieldType::Integer)),
            FieldType::map(FieldType::Any),
            FieldType::Boolean,
        ] {
            assert_eq!(parse_type(&ty.to_string(), &registry).unwrap(), ty);
        }
    }

    #[test]
    fn test_raw_identifiers_are_unescaped() {
        let schema = parse_schema("struct r#Msg { r#type: String }").unwrap();
        assert_eq!(schema.name(), "Msg");
        assert!(schema.field("type").is_some());
    }
}
