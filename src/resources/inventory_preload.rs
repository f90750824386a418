//! Inventory preload records: device data staged before enrollment.

use super::shared_schema;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::object::ModelObject;
use crate::resource::{Collection, Connection};
use crate::schema::validation;
use crate::schema::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema};

use serde_json::Value;
use std::sync::{Arc, OnceLock};

static SCHEMA: OnceLock<Arc<ObjectSchema>> = OnceLock::new();

pub const PATH: &str = "v2/inventory-preload/records";

/// Allowed `deviceType` values.
pub const DEVICE_TYPES: [&str; 3] = ["Computer", "Mobile Device", "Unknown"];

pub fn schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&SCHEMA, build_schema)
}

fn build_schema() -> ModelResult<ObjectSchema> {
    let text = |name: &str| AttributeDefinition::new(name, FieldType::string());
    ObjectSchema::builder("InventoryPreloadRecord")
        .collection()
        .extendable()
        .attribute(
            AttributeDefinition::new("id", FieldType::jamf_id())
                .readonly()
                .identifier(IdentifierKind::Primary),
        )
        .attribute(
            text("serialNumber")
                .required()
                .identifier(IdentifierKind::Secondary)
                .validator(validation::NON_EMPTY_STRING),
        )
        .attribute(text("deviceType").required().enum_values(DEVICE_TYPES))
        .attribute(text("username"))
        .attribute(text("fullName"))
        .attribute(text("emailAddress").validator(validation::EMAIL_ADDRESS))
        .attribute(text("phoneNumber"))
        .attribute(text("position"))
        .attribute(text("department"))
        .attribute(text("building"))
        .attribute(text("room"))
        .attribute(text("poNumber"))
        .attribute(text("poDate").validator(validation::DATE_YYYY_MM_DD))
        .attribute(text("warrantyExpiration").validator(validation::DATE_YYYY_MM_DD))
        .attribute(text("appleCareId"))
        .attribute(AttributeDefinition::new("lifeExpectancy", FieldType::integer()))
        .attribute(text("purchasePrice"))
        .attribute(text("purchasingContact"))
        .attribute(text("purchasingAccount"))
        .attribute(text("leaseExpiration").validator(validation::DATE_YYYY_MM_DD))
        .attribute(text("barCode1"))
        .attribute(text("barCode2"))
        .attribute(text("assetTag"))
        .attribute(text("vendor"))
        .build()
}

/// A preload record keyed by serial number.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryPreloadRecord {
    object: ModelObject,
}

impl InventoryPreloadRecord {
    pub fn collection(config: ModelConfig) -> ModelResult<Collection> {
        Ok(Collection::with_config(schema()?, PATH, config))
    }

    /// An unsaved record from caller data; every key is recorded as a change.
    pub fn create(payload: &Value) -> ModelResult<Self> {
        Self::from_object(ModelObject::create(schema()?, payload)?)
    }

    pub fn parse(payload: &Value) -> ModelResult<Self> {
        Self::from_object(ModelObject::parse(schema()?, payload)?)
    }

    pub fn from_object(object: ModelObject) -> ModelResult<Self> {
        if object.kind() != "InventoryPreloadRecord" {
            return Err(ModelError::invalid_data(format!(
                "Expected an InventoryPreloadRecord, got {}",
                object.kind()
            )));
        }
        Ok(Self { object })
    }

    pub fn id(&self) -> Option<&str> {
        self.object.primary_id()
    }

    pub fn serial_number(&self) -> ModelResult<Option<&str>> {
        self.object.get_str("serialNumber")
    }

    pub fn set_serial_number(&mut self, serial: &str) -> ModelResult<()> {
        self.object.set("serialNumber", serial)
    }

    pub fn device_type(&self) -> ModelResult<Option<&str>> {
        self.object.get_str("deviceType")
    }

    pub fn set_device_type(&mut self, device_type: &str) -> ModelResult<()> {
        self.object.set("deviceType", device_type)
    }

    pub fn username(&self) -> ModelResult<Option<&str>> {
        self.object.get_str("username")
    }

    pub fn set_username(&mut self, username: &str) -> ModelResult<()> {
        self.object.set("username", username)
    }

    /// Create or update through the collection.
    pub fn save<C: Connection + ?Sized>(&mut self, conn: &C, collection: &Collection) -> ModelResult<String> {
        collection.save(conn, &mut self.object)
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
