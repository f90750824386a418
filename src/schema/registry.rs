//! Registry of object schemas.
//!
//! Registration is idempotent: the first schema registered under a name wins
//! and every later registration of that name returns the stored schema
//! without further work.

use super::types::ObjectSchema;
use crate::error::{ModelError, ModelResult};

use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry mapping object kind names to their schemas.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<ObjectSchema>>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, or return the one already registered under its name.
    pub fn register(&self, schema: ObjectSchema) -> Arc<ObjectSchema> {
        self.register_shared(Arc::new(schema))
    }

    /// [`register`](Self::register) for a schema that is already shared.
    pub fn register_shared(&self, schema: Arc<ObjectSchema>) -> Arc<ObjectSchema> {
        let mut schemas = self.schemas.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = schemas.get(schema.name()) {
            trace!("Schema {} already registered, skipping", schema.name());
            return Arc::clone(existing);
        }
        debug!(
            "Registering schema {} with {} attributes",
            schema.name(),
            schema.attributes().len()
        );
        schemas.insert(schema.name().to_string(), Arc::clone(&schema));
        schema
    }

    /// Get a schema by object kind name.
    pub fn get(&self, name: &str) -> Option<Arc<ObjectSchema>> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Get a schema, failing with `NoSuchItem` when it is not registered.
    pub fn require(&self, name: &str) -> ModelResult<Arc<ObjectSchema>> {
        self.get(name)
            .ok_or_else(|| ModelError::no_such_item("schema", name))
    }

    /// Whether a schema is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered kind names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
