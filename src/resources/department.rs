//! Departments.

use super::shared_schema;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::object::ModelObject;
use crate::resource::Collection;
use crate::schema::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema};

use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};

static SCHEMA: OnceLock<Arc<ObjectSchema>> = OnceLock::new();

pub const PATH: &str = "v1/departments";

pub fn schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&SCHEMA, || {
        ObjectSchema::builder("Department")
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
            )
            .build()
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    object: ModelObject,
}

impl Department {
    pub fn collection(config: ModelConfig) -> ModelResult<Collection> {
        Ok(Collection::with_config(schema()?, PATH, config))
    }

    pub fn create(name: &str) -> ModelResult<Self> {
        Self::from_object(ModelObject::create(schema()?, &json!({ "name": name }))?)
    }

    pub fn parse(payload: &Value) -> ModelResult<Self> {
        Self::from_object(ModelObject::parse(schema()?, payload)?)
    }

    pub fn from_object(object: ModelObject) -> ModelResult<Self> {
        if object.kind() != "Department" {
            return Err(ModelError::invalid_data(format!(
                "Expected a Department, got {}",
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
