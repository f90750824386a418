//! The schema-driven object instance.
//!
//! A [`ModelObject`] stores one value per declared attribute and derives its
//! behaviour from the [`ObjectSchema`] it was built with: which names exist,
//! which may be written, how candidate values are validated, and how the
//! object maps to and from the wire.
//!
//! Every setter validates the complete candidate before touching state, so a
//! failed call never leaves a partially updated attribute behind.

use super::changes::{ChangeLedger, UnsavedChange};
use super::extension::{EXTENSION_ATTRIBUTES_KEY, ExtensionAttribute, ExtensionAttributes};
use super::value::FieldValue;
use crate::error::{ModelError, ModelResult};
use crate::schema::types::{AttributeDefinition, FieldType, ObjectSchema, PrimitiveKind};
use crate::schema::validation;

use log::trace;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Identifier values already taken within a collection.
///
/// Supplied by the collection layer so that setters can reject a name or
/// serial number that another object already uses.
#[derive(Debug, Clone, Default)]
pub struct KnownIdentifiers {
    values: HashMap<String, HashSet<String>>,
}

impl KnownIdentifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<String>) {
        self.values
            .entry(attribute.into())
            .or_default()
            .insert(value.into());
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, attribute: &str, value: &str) -> bool {
        self.values
            .get(attribute)
            .is_some_and(|set| set.iter().any(|v| v.eq_ignore_ascii_case(value)))
    }
}

/// One object instance whose shape is defined by an [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct ModelObject {
    pub(super) schema: Arc<ObjectSchema>,
    pub(super) values: HashMap<String, FieldValue>,
    pub(super) changes: ChangeLedger,
    pub(super) extension_attributes: Option<ExtensionAttributes>,
    known_identifiers: Option<Arc<KnownIdentifiers>>,
}

impl PartialEq for ModelObject {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name()
            && self.values == other.values
            && self.extension_attributes == other.extension_attributes
    }
}

impl ModelObject {
    /// An empty instance: every single value null, every list empty.
    pub fn new(schema: Arc<ObjectSchema>) -> Self {
        let values = schema
            .attributes()
            .iter()
            .map(|def| (def.name.clone(), empty_value(def)))
            .collect();
        let extension_attributes = schema.is_extendable().then(ExtensionAttributes::new);
        Self {
            schema,
            values,
            changes: ChangeLedger::default(),
            extension_attributes,
            known_identifiers: None,
        }
    }

    /// Build a new, unsaved instance from caller data.
    ///
    /// Every key goes through the setters, so the whole payload becomes
    /// unsaved changes. Readonly attributes cannot be supplied.
    pub fn create(schema: Arc<ObjectSchema>, payload: &Value) -> ModelResult<Self> {
        Self::create_with_known_identifiers(schema, payload, None)
    }

    /// [`create`](Self::create) with uniqueness checking against a collection.
    pub fn create_with_known_identifiers(
        schema: Arc<ObjectSchema>,
        payload: &Value,
        known: Option<Arc<KnownIdentifiers>>,
    ) -> ModelResult<Self> {
        let obj = payload.as_object().ok_or_else(|| {
            ModelError::invalid_data(format!("{} data must be a JSON object", schema.name()))
        })?;
        let mut object = Self::new(schema);
        object.known_identifiers = known;

        for (key, value) in obj {
            if key == EXTENSION_ATTRIBUTES_KEY && object.extension_attributes.is_some() {
                object.set_extension_attributes_from(value)?;
                continue;
            }
            let def = object.schema.require_attribute(key)?;
            if def.multi {
                let items = value.as_array().cloned().ok_or_else(|| {
                    ModelError::invalid_data(format!("{} must be an array", def.name))
                })?;
                object.replace_list(key, items)?;
            } else {
                object.set(key, value.clone())?;
            }
        }
        trace!(
            "Created {} with {} pending changes",
            object.kind(),
            object.changes.iter().count()
        );
        Ok(object)
    }

    /// Build a nested value from caller data, validating every attribute.
    ///
    /// Unlike [`create`](Self::create) nothing is recorded as a change and
    /// readonly attributes may be supplied; the owning object records the
    /// assignment as a whole.
    pub(crate) fn construct(schema: Arc<ObjectSchema>, payload: &Value) -> ModelResult<Self> {
        let obj = payload.as_object().ok_or_else(|| {
            ModelError::invalid_data(format!("{} data must be a JSON object", schema.name()))
        })?;
        let mut object = Self::new(Arc::clone(&schema));

        for (key, raw) in obj {
            if key == EXTENSION_ATTRIBUTES_KEY && schema.is_extendable() {
                object.extension_attributes = Some(ExtensionAttributes::from_wire(Some(raw))?);
                continue;
            }
            let def = schema.require_attribute(key)?;
            let value = if def.multi {
                let items = raw
                    .as_array()
                    .ok_or_else(|| ModelError::invalid_data(format!("{} must be an array", def.name)))?
                    .iter()
                    .map(|v| validate_item(def, v.clone()))
                    .collect::<ModelResult<Vec<_>>>()?;
                validation::validate_array_size(items.len(), def)?;
                FieldValue::List(items)
            } else {
                validate_attribute(def, raw.clone())?
            };
            object.values.insert(def.name.clone(), value);
        }
        object.validate_for_save()?;
        Ok(object)
    }

    fn set_extension_attributes_from(&mut self, raw: &Value) -> ModelResult<()> {
        let items = raw.as_array().ok_or_else(|| {
            ModelError::invalid_data(format!("{} must be an array", EXTENSION_ATTRIBUTES_KEY))
        })?;
        for item in items {
            let name = item.get("name").and_then(Value::as_str).ok_or_else(|| {
                ModelError::invalid_data("Extension attribute is missing 'name'")
            })?;
            let value = item.get("value").cloned().unwrap_or(Value::Null);
            if let Some(eas) = self.extension_attributes.as_mut() {
                eas.declare(ExtensionAttribute::new(name, Default::default()));
            }
            self.set_extension_attribute(name, value)?;
        }
        Ok(())
    }

    /// Attach the identifiers already used in the owning collection.
    pub fn with_known_identifiers(mut self, known: Arc<KnownIdentifiers>) -> Self {
        self.known_identifiers = Some(known);
        self
    }

    pub fn schema(&self) -> &Arc<ObjectSchema> {
        &self.schema
    }

    /// Object kind name from the schema.
    pub fn kind(&self) -> &str {
        self.schema.name()
    }

    /// Value of the primary identifier, when declared and set.
    pub fn primary_id(&self) -> Option<&str> {
        let def = self.schema.primary_identifier()?;
        self.values.get(&def.name).and_then(FieldValue::as_str)
    }

    // ----- getters -----

    /// Current value of an attribute, by name or alias.
    pub fn get(&self, name: &str) -> ModelResult<&FieldValue> {
        let def = self.schema.require_attribute(name)?;
        Ok(self.values.get(&def.name).unwrap_or(&FieldValue::Null))
    }

    pub fn get_str(&self, name: &str) -> ModelResult<Option<&str>> {
        Ok(self.get(name)?.as_str())
    }

    pub fn get_i64(&self, name: &str) -> ModelResult<Option<i64>> {
        Ok(self.get(name)?.as_i64())
    }

    pub fn get_f64(&self, name: &str) -> ModelResult<Option<f64>> {
        Ok(self.get(name)?.as_f64())
    }

    pub fn get_bool(&self, name: &str) -> ModelResult<Option<bool>> {
        Ok(self.get(name)?.as_bool())
    }

    /// Predicate form of a boolean attribute; null reads as false.
    pub fn is(&self, name: &str) -> ModelResult<bool> {
        let def = self.schema.require_attribute(name)?;
        if !def.field_type.is_boolean() || def.multi {
            return Err(ModelError::unsupported(format!(
                "{}.{} is not a boolean attribute",
                self.kind(),
                def.name
            )));
        }
        Ok(self.get(name)?.as_bool().unwrap_or(false))
    }

    /// Read-only view of a multi-valued attribute.
    pub fn get_list(&self, name: &str) -> ModelResult<&[FieldValue]> {
        let def = self.multi_definition(name)?;
        Ok(self
            .values
            .get(&def.name)
            .and_then(FieldValue::as_list)
            .unwrap_or(&[]))
    }

    pub fn get_object(&self, name: &str) -> ModelResult<Option<&ModelObject>> {
        Ok(self.get(name)?.as_object())
    }

    /// Mutable access to a nested object; its changes bubble up to this one.
    pub fn get_object_mut(&mut self, name: &str) -> ModelResult<Option<&mut ModelObject>> {
        let def = self.schema.require_attribute(name)?;
        let key = def.name.clone();
        Ok(self.values.get_mut(&key).and_then(FieldValue::as_object_mut))
    }

    /// Mutable access to one nested object inside a list.
    pub fn get_list_object_mut(
        &mut self,
        name: &str,
        index: usize,
    ) -> ModelResult<Option<&mut ModelObject>> {
        let key = self.multi_definition(name)?.name.clone();
        Ok(match self.values.get_mut(&key) {
            Some(FieldValue::List(items)) => items.get_mut(index).and_then(FieldValue::as_object_mut),
            _ => None,
        })
    }

    pub fn extension_attributes(&self) -> Option<&ExtensionAttributes> {
        self.extension_attributes.as_ref()
    }

    /// Validate a candidate for `name` without assigning it.
    ///
    /// Applies the same rules as the setters, identifier uniqueness
    /// included, and returns the coerced value. Lists are checked item by
    /// item and then as a whole.
    pub fn validate(&self, name: &str, value: impl Into<Value>) -> ModelResult<FieldValue> {
        let def = self.schema.require_attribute(name)?;
        let value = value.into();
        if def.multi {
            let Value::Array(items) = value else {
                return Err(ModelError::invalid_data(format!(
                    "{} must be an array",
                    def.name
                )));
            };
            let list = items
                .into_iter()
                .map(|v| validate_item(def, v))
                .collect::<ModelResult<Vec<_>>>()?;
            validate_list(def, &list)?;
            return Ok(FieldValue::List(list));
        }
        let candidate = validate_attribute(def, value)?;
        self.check_unique(def, &candidate)?;
        Ok(candidate)
    }

    // ----- single-value setters -----

    /// Validate and assign a single-valued attribute.
    ///
    /// Assigning the current value is not a change.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        if def.multi {
            return Err(ModelError::invalid_data(format!(
                "{} is multi-valued; use replace_list or the list mutators",
                def.name
            )));
        }
        let new = validate_attribute(def, value.into())?;
        self.check_unique(def, &new)?;
        self.commit(def, new);
        Ok(())
    }

    /// Assign an already-built nested object.
    pub fn set_object(&mut self, name: &str, object: ModelObject) -> ModelResult<()> {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        let new = nested_item(def, FieldValue::from(object))?;
        if def.multi {
            return Err(ModelError::invalid_data(format!(
                "{} is multi-valued; use the list mutators",
                def.name
            )));
        }
        self.commit(def, new);
        Ok(())
    }

    /// Clear a single-valued attribute; required attributes refuse.
    pub fn set_null(&mut self, name: &str) -> ModelResult<()> {
        self.set(name, Value::Null)
    }

    // ----- multi-valued setters -----

    /// Replace the whole list.
    pub fn replace_list(&mut self, name: &str, values: Vec<Value>) -> ModelResult<()> {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        let items = values
            .into_iter()
            .map(|v| validate_item(def, v))
            .collect::<ModelResult<Vec<_>>>()?;
        self.mutate_list(def, |list| {
            *list = items;
            Ok(())
        })
    }

    pub fn append(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        let item = validate_item(def, value.into())?;
        self.mutate_list(def, |list| {
            list.push(item);
            Ok(())
        })
    }

    pub fn prepend(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        let item = validate_item(def, value.into())?;
        self.mutate_list(def, |list| {
            list.insert(0, item);
            Ok(())
        })
    }

    /// Insert before `index`; `index == len` appends.
    pub fn insert_at(&mut self, name: &str, index: usize, value: impl Into<Value>) -> ModelResult<()> {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        let item = validate_item(def, value.into())?;
        self.mutate_list(def, |list| {
            if index > list.len() {
                return Err(ModelError::no_such_item(
                    format!("{} index", def.name),
                    index.to_string(),
                ));
            }
            list.insert(index, item);
            Ok(())
        })
    }

    /// Remove and return the item at `index`.
    pub fn delete_at(&mut self, name: &str, index: usize) -> ModelResult<FieldValue> {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        let mut removed = FieldValue::Null;
        self.mutate_list(def, |list| {
            if index >= list.len() {
                return Err(ModelError::no_such_item(
                    format!("{} index", def.name),
                    index.to_string(),
                ));
            }
            removed = list.remove(index);
            Ok(())
        })?;
        Ok(removed)
    }

    /// Remove every item matching the predicate; returns how many were removed.
    pub fn delete_if<F>(&mut self, name: &str, mut predicate: F) -> ModelResult<usize>
    where
        F: FnMut(&FieldValue) -> bool,
    {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        let mut removed = 0;
        self.mutate_list(def, |list| {
            let before = list.len();
            list.retain(|item| !predicate(item));
            removed = before - list.len();
            Ok(())
        })?;
        Ok(removed)
    }

    /// Remove every item equal to `value` after validation.
    pub fn delete_value(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<usize> {
        let schema = Arc::clone(&self.schema);
        let def = self.writable_definition(&schema, name)?;
        let target = validate_item(def, value.into())?;
        self.delete_if(name, |item| *item == target)
    }

    // ----- extension attributes -----

    /// Set an extension attribute value on an extendable object.
    pub fn set_extension_attribute(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        self.ensure_mutable()?;
        let kind = self.kind().to_string();
        self.extension_attributes
            .as_mut()
            .ok_or_else(|| {
                ModelError::unsupported(format!("{} does not have extension attributes", kind))
            })?
            .set(name, value.into())
    }

    /// Make an extension attribute known so it can be set before the server reports it.
    pub fn declare_extension_attribute(&mut self, attribute: ExtensionAttribute) -> ModelResult<()> {
        let kind = self.kind().to_string();
        self.extension_attributes
            .as_mut()
            .ok_or_else(|| {
                ModelError::unsupported(format!("{} does not have extension attributes", kind))
            })?
            .declare(attribute);
        Ok(())
    }

    // ----- change tracking -----

    /// Pending changes, including those inside nested objects and extension attributes.
    pub fn unsaved_changes(&self) -> BTreeMap<String, UnsavedChange> {
        let mut changes: BTreeMap<String, UnsavedChange> = self
            .changes
            .iter()
            .map(|(k, c)| (k.clone(), UnsavedChange::Value(c.clone())))
            .collect();

        for def in self.schema.attributes() {
            if changes.contains_key(&def.name) {
                continue;
            }
            match self.values.get(&def.name) {
                Some(FieldValue::Object(nested)) if nested.has_unsaved_changes() => {
                    changes.insert(def.name.clone(), UnsavedChange::Nested(nested.unsaved_changes()));
                }
                Some(FieldValue::List(items)) => {
                    let nested: BTreeMap<String, UnsavedChange> = items
                        .iter()
                        .enumerate()
                        .filter_map(|(i, item)| match item {
                            FieldValue::Object(o) if o.has_unsaved_changes() => {
                                Some((i.to_string(), UnsavedChange::Nested(o.unsaved_changes())))
                            }
                            _ => None,
                        })
                        .collect();
                    if !nested.is_empty() {
                        changes.insert(def.name.clone(), UnsavedChange::Nested(nested));
                    }
                }
                _ => {}
            }
        }

        if let Some(eas) = &self.extension_attributes {
            if eas.has_unsaved_changes() {
                changes.insert(
                    EXTENSION_ATTRIBUTES_KEY.to_string(),
                    UnsavedChange::Nested(eas.unsaved_changes()),
                );
            }
        }
        changes
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.changes.is_empty()
            || self.values.values().any(FieldValue::has_nested_changes)
            || self
                .extension_attributes
                .as_ref()
                .is_some_and(ExtensionAttributes::has_unsaved_changes)
    }

    /// Mark everything as saved, recursing into nested data.
    pub fn clear_unsaved_changes(&mut self) {
        self.changes.clear();
        self.values
            .values_mut()
            .for_each(FieldValue::clear_nested_changes);
        if let Some(eas) = self.extension_attributes.as_mut() {
            eas.clear_unsaved_changes();
        }
    }

    /// Check that every required attribute has a value.
    pub fn validate_for_save(&self) -> ModelResult<()> {
        for def in self.schema.attributes() {
            let value = self.values.get(&def.name).unwrap_or(&FieldValue::Null);
            if def.required && value.is_empty() {
                return Err(ModelError::missing_data(format!(
                    "{} requires a value for {}",
                    self.kind(),
                    def.name
                )));
            }
            if let FieldValue::Object(nested) = value {
                nested.validate_for_save()?;
            }
        }
        Ok(())
    }

    // ----- internals -----

    fn ensure_mutable(&self) -> ModelResult<()> {
        if self.schema.is_immutable() {
            return Err(ModelError::unsupported(format!(
                "{} objects cannot be modified",
                self.kind()
            )));
        }
        Ok(())
    }

    fn writable_definition<'s>(
        &self,
        schema: &'s ObjectSchema,
        name: &str,
    ) -> ModelResult<&'s AttributeDefinition> {
        self.ensure_mutable()?;
        let def = schema.require_attribute(name)?;
        if def.readonly {
            return Err(ModelError::unsupported(format!(
                "{}.{} is read-only",
                schema.name(),
                def.name
            )));
        }
        Ok(def)
    }

    fn multi_definition(&self, name: &str) -> ModelResult<&AttributeDefinition> {
        let def = self.schema.require_attribute(name)?;
        if !def.multi {
            return Err(ModelError::unsupported(format!(
                "{}.{} is not multi-valued",
                self.kind(),
                def.name
            )));
        }
        Ok(def)
    }

    fn check_unique(&self, def: &AttributeDefinition, new: &FieldValue) -> ModelResult<()> {
        if !def.is_identifier() || !self.schema.is_collection() {
            return Ok(());
        }
        let (Some(known), Some(text)) = (&self.known_identifiers, identifier_text(new)) else {
            return Ok(());
        };
        // The object's own saved value is not taken by another member.
        let saved = match self.changes.get(&def.name) {
            Some(change) => identifier_text(&change.old),
            None => self.values.get(&def.name).and_then(identifier_text),
        };
        if saved.is_some_and(|own| own.eq_ignore_ascii_case(&text)) {
            return Ok(());
        }
        if known.contains(&def.name, &text) {
            return Err(ModelError::already_exists(format!(
                "A {} already exists with {} '{}'",
                self.kind(),
                def.name,
                text
            )));
        }
        Ok(())
    }

    fn commit(&mut self, def: &AttributeDefinition, new: FieldValue) {
        let current = self.values.get(&def.name).cloned().unwrap_or_default();
        if current == new {
            return;
        }
        trace!("{}.{} changed", self.kind(), def.name);
        self.values.insert(def.name.clone(), new.clone());
        self.changes.note(&def.name, current, new);
    }

    fn mutate_list<F>(&mut self, def: &AttributeDefinition, f: F) -> ModelResult<()>
    where
        F: FnOnce(&mut Vec<FieldValue>) -> ModelResult<()>,
    {
        if !def.multi {
            return Err(ModelError::unsupported(format!(
                "{}.{} is not multi-valued",
                self.kind(),
                def.name
            )));
        }
        let old = match self.values.get(&def.name) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        };
        let mut list = old.clone();
        f(&mut list)?;
        validate_list(def, &list)?;
        self.commit(def, FieldValue::List(list));
        Ok(())
    }
}

fn empty_value(def: &AttributeDefinition) -> FieldValue {
    if def.multi {
        FieldValue::List(Vec::new())
    } else {
        FieldValue::Null
    }
}

fn identifier_text(value: &FieldValue) -> Option<String> {
    match value.as_json()? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Validate a candidate for a single-valued attribute, enforcing `required`.
pub(crate) fn validate_attribute(def: &AttributeDefinition, value: Value) -> ModelResult<FieldValue> {
    if validation::is_empty_value(&value) && def.required {
        return Err(ModelError::missing_data(format!(
            "{} requires a value",
            def.name
        )));
    }
    if value.is_null() {
        return Ok(FieldValue::Null);
    }
    validate_item(def, value)
}

/// Validate one value (a single value, or one list element).
///
/// Exactly one rule applies, in priority order: custom validator, enum,
/// primitive type, identifier format, nested construction, passthrough.
pub(crate) fn validate_item(def: &AttributeDefinition, value: Value) -> ModelResult<FieldValue> {
    if value.is_null() {
        return Err(ModelError::invalid_data(format!(
            "{} cannot hold a null item",
            def.name
        )));
    }
    if let Some(validator) = &def.validator {
        return validator.validate(&value, &def.name).map(FieldValue::Json);
    }
    if !def.enum_values.is_empty() {
        return validation::validate_enum(&value, &def.enum_values, &def.name).map(FieldValue::Json);
    }
    match &def.field_type {
        FieldType::Primitive(PrimitiveKind::JamfId) | FieldType::IdReference(_) => {
            validation::validate_jamf_id(&value, &def.name).map(FieldValue::Json)
        }
        FieldType::Primitive(kind) => {
            validation::validate_primitive(*kind, &value, &def.name).map(FieldValue::Json)
        }
        FieldType::Nested(schema) => {
            ModelObject::construct(Arc::clone(schema), &value).map(FieldValue::from)
        }
        FieldType::Any => Ok(FieldValue::Json(value)),
    }
}

/// Accept a pre-built nested object if its kind matches the declaration.
fn nested_item(def: &AttributeDefinition, value: FieldValue) -> ModelResult<FieldValue> {
    match (&def.field_type, &value) {
        (FieldType::Nested(schema), FieldValue::Object(obj)) if obj.kind() == schema.name() => {
            Ok(value)
        }
        _ => Err(ModelError::invalid_data(format!(
            "{} requires a {}",
            def.name,
            def.field_type.describe()
        ))),
    }
}

/// Whole-list validation run before any list mutation is committed.
fn validate_list(def: &AttributeDefinition, list: &[FieldValue]) -> ModelResult<()> {
    validation::validate_array_size(list.len(), def)?;
    for item in list {
        match item {
            FieldValue::Json(v) => {
                validate_item(def, v.clone())?;
            }
            FieldValue::Object(_) => {
                nested_item(def, item.clone())?;
            }
            FieldValue::Null | FieldValue::List(_) => {
                return Err(ModelError::invalid_data(format!(
                    "{} contains an invalid item",
                    def.name
                )));
            }
        }
    }
    Ok(())
}
