//! Name-indexed schema registry.

use crate::schema::SchemaRef;
use std::collections::HashMap;

/// A registry of schemas addressable by name.
///
/// The schema DSL resolves type references through a registry, so schemas
/// defined in one source text can be referenced from another.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, SchemaRef>,
}

impl SchemaRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, returning the one it replaced.
    pub fn register(&mut self, schema: SchemaRef) -> Option<SchemaRef> {
        self.schemas.insert(schema.name().to_string(), schema)
    }

    /// Get a schema by name.
    pub fn get(&self, name: &str) -> Option<&SchemaRef> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Get all registered schemas.
    pub fn schemas(&self) -> impl Iterator<Item = &SchemaRef> {
        self.schemas.values()
    }

    /// Get the number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl FromIterator<SchemaRef> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = SchemaRef>>(iter: I) -> Self {
        let mut registry = Self::new();
        for schema in iter {
            registry.register(schema);
        }
        registry
    }
}
