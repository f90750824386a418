//! Buildings.

use super::shared_schema;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::object::ModelObject;
use crate::resource::Collection;
use crate::schema::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema};

use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};

static SCHEMA: OnceLock<Arc<ObjectSchema>> = OnceLock::new();

/// Endpoint of the building collection.
pub const PATH: &str = "v1/buildings";

/// Address fields in declaration order.
const ADDRESS_FIELDS: [&str; 6] = [
    "streetAddress1",
    "streetAddress2",
    "city",
    "stateProvince",
    "zipPostalCode",
    "country",
];

pub fn schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&SCHEMA, build_schema)
}

fn build_schema() -> ModelResult<ObjectSchema> {
    let mut builder = ObjectSchema::builder("Building")
        .collection()
        .attribute(
            AttributeDefinition::new("id", FieldType::jamf_id())
                .readonly()
                .identifier(IdentifierKind::Primary),
        )
        .attribute(
            AttributeDefinition::new("name", FieldType::string())
                .required()
                .identifier(IdentifierKind::Secondary),
        );
    for field in ADDRESS_FIELDS {
        builder = builder.attribute(AttributeDefinition::new(field, FieldType::string()));
    }
    builder.build()
}

/// A building, with its postal address.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    object: ModelObject,
}

impl Building {
    pub fn collection(config: ModelConfig) -> ModelResult<Collection> {
        Ok(Collection::with_config(schema()?, PATH, config))
    }

    /// An unsaved building.
    pub fn create(name: &str) -> ModelResult<Self> {
        Self::from_object(ModelObject::create(schema()?, &json!({ "name": name }))?)
    }

    /// A building from a server payload.
    pub fn parse(payload: &Value) -> ModelResult<Self> {
        Self::from_object(ModelObject::parse(schema()?, payload)?)
    }

    pub fn from_object(object: ModelObject) -> ModelResult<Self> {
        if object.kind() != "Building" {
            return Err(ModelError::invalid_data(format!(
                "Expected a Building, got {}",
                object.kind()
            )));
        }
        Ok(Self { object })
    }

    pub fn id(&self) -> Option<&str> {
        self.object.primary_id()
    }

    pub fn name(&self) -> ModelResult<&str> {
        Ok(self.object.get_str("name")?.unwrap_or_default())
    }

    pub fn set_name(&mut self, name: &str) -> ModelResult<()> {
        self.object.set("name", name)
    }

    pub fn city(&self) -> ModelResult<Option<&str>> {
        self.object.get_str("city")
    }

    pub fn set_city(&mut self, city: &str) -> ModelResult<()> {
        self.object.set("city", city)
    }

    /// Non-empty address lines in display order.
    pub fn address_lines(&self) -> ModelResult<Vec<&str>> {
        let mut lines = Vec::new();
        for field in ADDRESS_FIELDS {
            if let Some(line) = self.object.get_str(field)?.filter(|l| !l.trim().is_empty()) {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    pub fn object(&self) -> &ModelObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut ModelObject {
        &mut self.object
    }

    pub fn into_object(self) -> ModelObject {
        self.object
    }
}
