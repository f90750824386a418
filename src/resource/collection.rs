//! Fetch, create, update and delete for one collection endpoint.

use super::connection::Connection;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::object::{FieldValue, KnownIdentifiers, ModelObject};
use crate::schema::{IdentifierKind, ObjectSchema};

use log::{debug, info};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// A collection resource: a schema plus the endpoint that serves it.
///
/// The full list is fetched once and memoized until [`refresh`](Self::refresh)
/// or a successful write through this collection.
#[derive(Debug)]
pub struct Collection {
    schema: Arc<ObjectSchema>,
    path: String,
    config: ModelConfig,
    cached: Mutex<Option<Arc<Vec<ModelObject>>>>,
}

impl Collection {
    pub fn new(schema: Arc<ObjectSchema>, path: impl Into<String>) -> Self {
        Self::with_config(schema, path, ModelConfig::default())
    }

    pub fn with_config(schema: Arc<ObjectSchema>, path: impl Into<String>, config: ModelConfig) -> Self {
        Self {
            schema,
            path: path.into().trim_end_matches('/').to_string(),
            config,
            cached: Mutex::new(None),
        }
    }

    pub fn schema(&self) -> &Arc<ObjectSchema> {
        &self.schema
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of one member.
    pub fn member_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Every member, fetched once.
    ///
    /// Accepts a bare array or a `{"results": [...]}` page.
    pub fn fetch_all<C: Connection + ?Sized>(&self, conn: &C) -> ModelResult<Arc<Vec<ModelObject>>> {
        if let Some(list) = self.lock().as_ref() {
            return Ok(Arc::clone(list));
        }
        let response = conn.get(&self.path)?;
        let items = match &response {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("results") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ModelError::invalid_data(format!(
                        "{} list response has no results array",
                        self.path
                    )));
                }
            },
            other => {
                return Err(ModelError::invalid_data(format!(
                    "{} list response is not a list: {}",
                    self.path, other
                )));
            }
        };
        let parsed = items
            .iter()
            .map(|item| ModelObject::parse(Arc::clone(&self.schema), item))
            .collect::<ModelResult<Vec<_>>>()?;
        debug!("Fetched {} {} objects from {}", parsed.len(), self.schema.name(), self.path);
        let list = Arc::new(parsed);
        *self.lock() = Some(Arc::clone(&list));
        Ok(list)
    }

    /// Forget the memoized list.
    pub fn refresh(&self) {
        *self.lock() = None;
    }

    /// Fetch one member by primary id.
    pub fn fetch<C: Connection + ?Sized>(&self, conn: &C, id: &str) -> ModelResult<ModelObject> {
        let payload = conn.get(&self.member_path(id))?;
        let object = ModelObject::parse(Arc::clone(&self.schema), &payload)?;
        self.attach_known_identifiers(conn, object)
    }

    /// Fetch one member by primary id or any secondary identifier.
    pub fn fetch_by_identifier<C: Connection + ?Sized>(
        &self,
        conn: &C,
        identifier: &str,
    ) -> ModelResult<ModelObject> {
        let id = self
            .valid_id(conn, identifier)?
            .ok_or_else(|| ModelError::no_such_item(self.schema.name(), identifier))?;
        self.fetch(conn, &id)
    }

    /// Resolve an identifier to a primary id.
    ///
    /// Primary ids match exactly and win; secondary identifiers match
    /// case-insensitively in declaration order.
    pub fn valid_id<C: Connection + ?Sized>(&self, conn: &C, identifier: &str) -> ModelResult<Option<String>> {
        let list = self.fetch_all(conn)?;
        if list.iter().any(|obj| obj.primary_id() == Some(identifier)) {
            return Ok(Some(identifier.to_string()));
        }
        for def in self.schema.identifiers() {
            let hit = list.iter().find(|obj| {
                identifier_text(obj, &def.name)
                    .is_some_and(|value| value.eq_ignore_ascii_case(identifier))
            });
            if let Some(obj) = hit {
                return Ok(obj.primary_id().map(str::to_string));
            }
        }
        Ok(None)
    }

    /// Map every primary id to the wire value of another attribute.
    pub fn map_all_ids_to<C: Connection + ?Sized>(
        &self,
        conn: &C,
        attribute: &str,
    ) -> ModelResult<BTreeMap<String, Value>> {
        self.schema.require_attribute(attribute)?;
        let list = self.fetch_all(conn)?;
        let mut map = BTreeMap::new();
        for obj in list.iter() {
            if let Some(id) = obj.primary_id() {
                map.insert(id.to_string(), obj.get(attribute)?.to_wire());
            }
        }
        Ok(map)
    }

    /// Identifier values in use across the collection.
    pub fn known_identifiers<C: Connection + ?Sized>(&self, conn: &C) -> ModelResult<Arc<KnownIdentifiers>> {
        let list = self.fetch_all(conn)?;
        let mut known = KnownIdentifiers::new();
        for def in self.schema.identifiers() {
            for obj in list.iter() {
                if let Some(value) = identifier_text(obj, &def.name) {
                    known.insert(def.name.clone(), value);
                }
            }
        }
        Ok(Arc::new(known))
    }

    /// A new unsaved member built from caller data.
    pub fn new_object<C: Connection + ?Sized>(&self, conn: &C, payload: &Value) -> ModelResult<ModelObject> {
        let known = if self.config.enforce_unique_identifiers {
            Some(self.known_identifiers(conn)?)
        } else {
            None
        };
        ModelObject::create_with_known_identifiers(Arc::clone(&self.schema), payload, known)
    }

    /// Create or update depending on whether the object has a primary id.
    ///
    /// Returns the primary id. Changes are cleared only after the server
    /// accepts the write.
    pub fn save<C: Connection + ?Sized>(&self, conn: &C, object: &mut ModelObject) -> ModelResult<String> {
        self.check_kind(object)?;
        object.validate_for_save()?;
        match object.primary_id().map(str::to_string) {
            Some(id) => self.update(conn, object, &id),
            None => self.create(conn, object),
        }
    }

    /// POST the full wire body and store the returned id.
    pub fn create<C: Connection + ?Sized>(&self, conn: &C, object: &mut ModelObject) -> ModelResult<String> {
        self.check_kind(object)?;
        object.validate_for_save()?;
        let response = conn.post(&self.path, &object.to_wire())?;
        let id = response_id(&response).ok_or_else(|| {
            ModelError::invalid_data(format!("{} create response has no id: {}", self.path, response))
        })?;
        object.assign_primary_id(&id)?;
        object.clear_unsaved_changes();
        self.refresh();
        info!("Created {} {}", self.schema.name(), id);
        Ok(id)
    }

    /// PATCH pending changes. Nothing is sent when there are none.
    pub fn update<C: Connection + ?Sized>(
        &self,
        conn: &C,
        object: &mut ModelObject,
        id: &str,
    ) -> ModelResult<String> {
        self.check_kind(object)?;
        if !object.has_unsaved_changes() {
            debug!("{} {} has no changes to save", self.schema.name(), id);
            return Ok(id.to_string());
        }
        conn.patch(&self.member_path(id), &object.to_wire_changes_only())?;
        object.clear_unsaved_changes();
        self.refresh();
        info!("Updated {} {}", self.schema.name(), id);
        Ok(id.to_string())
    }

    pub fn delete<C: Connection + ?Sized>(&self, conn: &C, id: &str) -> ModelResult<()> {
        conn.delete(&self.member_path(id))?;
        self.refresh();
        info!("Deleted {} {}", self.schema.name(), id);
        Ok(())
    }

    fn attach_known_identifiers<C: Connection + ?Sized>(
        &self,
        conn: &C,
        object: ModelObject,
    ) -> ModelResult<ModelObject> {
        let has_secondary = self
            .schema
            .identifiers()
            .iter()
            .any(|def| def.identifier == IdentifierKind::Secondary);
        if !self.config.enforce_unique_identifiers || !has_secondary {
            return Ok(object);
        }
        Ok(object.with_known_identifiers(self.known_identifiers(conn)?))
    }

    fn check_kind(&self, object: &ModelObject) -> ModelResult<()> {
        if object.kind() != self.schema.name() {
            return Err(ModelError::invalid_data(format!(
                "Cannot save a {} through the {} collection",
                object.kind(),
                self.schema.name()
            )));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<Vec<ModelObject>>>> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn identifier_text(object: &ModelObject, attribute: &str) -> Option<String> {
    match object.get(attribute).ok()? {
        FieldValue::Json(Value::String(s)) => Some(s.clone()),
        FieldValue::Json(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn response_id(response: &Value) -> Option<String> {
    match response.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
