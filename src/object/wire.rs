//! Mapping between [`ModelObject`]s and the wire format.
//!
//! Parsing accepts a server payload as-is: no change is recorded and only
//! enum membership, nested construction and identifier coercion are applied.
//! Serialization walks the schema in declaration order.

use super::changes::UnsavedChange;
use super::extension::{EXTENSION_ATTRIBUTES_KEY, ExtensionAttributes};
use super::model::ModelObject;
use super::value::FieldValue;
use crate::error::{ModelError, ModelResult};
use crate::schema::types::{AttributeDefinition, FieldType, ObjectSchema, PrimitiveKind};
use crate::schema::validation;

use serde_json::{Map, Value};
use std::sync::Arc;

impl ModelObject {
    /// Build an instance from a server payload.
    ///
    /// A required attribute missing from the payload is `InvalidData`; absent
    /// optional values become null and absent lists become empty. Keys not in
    /// the schema are ignored.
    pub fn parse(schema: Arc<ObjectSchema>, payload: &Value) -> ModelResult<Self> {
        let obj = payload.as_object().ok_or_else(|| {
            ModelError::invalid_data(format!("{} data must be a JSON object", schema.name()))
        })?;
        let mut object = ModelObject::new(Arc::clone(&schema));

        for def in schema.attributes() {
            let raw = obj.get(&def.name).filter(|v| !v.is_null());
            let value = match raw {
                None if def.required => {
                    return Err(ModelError::invalid_data(format!(
                        "{} data is missing required attribute {}",
                        schema.name(),
                        def.name
                    )));
                }
                None if def.multi => FieldValue::List(Vec::new()),
                None => FieldValue::Null,
                Some(Value::Array(items)) if def.multi => FieldValue::List(
                    items
                        .iter()
                        .filter(|v| !v.is_null())
                        .map(|v| parse_item(def, v))
                        .collect::<ModelResult<Vec<_>>>()?,
                ),
                Some(other) if def.multi => {
                    return Err(ModelError::invalid_data(format!(
                        "{}.{} must be an array, got {}",
                        schema.name(),
                        def.name,
                        validation::describe_value(other)
                    )));
                }
                Some(v) => parse_item(def, v)?,
            };
            object.values.insert(def.name.clone(), value);
        }

        if schema.is_extendable() {
            object.extension_attributes =
                Some(ExtensionAttributes::from_wire(obj.get(EXTENSION_ATTRIBUTES_KEY))?);
        }
        Ok(object)
    }

    /// Full wire representation in schema declaration order.
    pub fn to_wire(&self) -> Value {
        let mut map = Map::new();
        for def in self.schema.attributes() {
            let value = self.values.get(&def.name).unwrap_or(&FieldValue::Null);
            map.insert(def.name.clone(), value.to_wire());
        }
        if let Some(eas) = &self.extension_attributes {
            map.insert(EXTENSION_ATTRIBUTES_KEY.to_string(), eas.to_wire());
        }
        Value::Object(map)
    }

    /// Wire representation of pending changes only, for partial updates.
    ///
    /// Readonly attributes are never emitted. A changed nested object emits
    /// its own changes; a list whose items changed is emitted whole.
    pub fn to_wire_changes_only(&self) -> Value {
        let mut map = Map::new();
        let changes = self.unsaved_changes();
        for def in self.schema.attributes() {
            if def.readonly {
                continue;
            }
            let Some(change) = changes.get(&def.name) else {
                continue;
            };
            let value = self.values.get(&def.name).unwrap_or(&FieldValue::Null);
            let wire = match (change, value) {
                (UnsavedChange::Nested(_), FieldValue::Object(nested)) => {
                    nested.to_wire_changes_only()
                }
                _ => value.to_wire(),
            };
            map.insert(def.name.clone(), wire);
        }
        if let Some(eas) = &self.extension_attributes {
            if eas.has_unsaved_changes() {
                map.insert(
                    EXTENSION_ATTRIBUTES_KEY.to_string(),
                    eas.to_wire_changes_only(),
                );
            }
        }
        Value::Object(map)
    }

    /// Store the id the server assigned on create. No change is recorded.
    pub(crate) fn assign_primary_id(&mut self, id: &str) -> ModelResult<()> {
        let name = self
            .schema
            .primary_identifier()
            .map(|def| def.name.clone())
            .ok_or_else(|| {
                ModelError::unsupported(format!("{} has no primary identifier", self.schema.name()))
            })?;
        self.values
            .insert(name, FieldValue::Json(Value::String(id.to_string())));
        Ok(())
    }
}

/// Convert one raw server value.
fn parse_item(def: &AttributeDefinition, raw: &Value) -> ModelResult<FieldValue> {
    if !def.enum_values.is_empty() {
        return validation::validate_enum(raw, &def.enum_values, &def.name).map(FieldValue::Json);
    }
    match &def.field_type {
        FieldType::Nested(schema) => ModelObject::parse(Arc::clone(schema), raw).map(FieldValue::from),
        FieldType::Primitive(PrimitiveKind::JamfId) | FieldType::IdReference(_) => {
            Ok(FieldValue::Json(match raw {
                Value::Number(n) => Value::String(n.to_string()),
                other => other.clone(),
            }))
        }
        _ => Ok(FieldValue::Json(raw.clone())),
    }
}
