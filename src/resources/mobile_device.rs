//! Mobile devices: a list summary plus lazily fetched details.
//!
//! The collection endpoint returns a short summary per device. The full
//! record lives at `{id}/detail` and is fetched on the first call to
//! [`MobileDevice::details`], then kept for the life of the value.

use super::shared_schema;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::object::ModelObject;
use crate::resource::{Collection, Connection};
use crate::schema::validation;
use crate::schema::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema};
use crate::scope::ScopeSubject;

use log::debug;
use serde_json::Value;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

static SUMMARY: OnceLock<Arc<ObjectSchema>> = OnceLock::new();
static DETAILS: OnceLock<Arc<ObjectSchema>> = OnceLock::new();
static LOCATION: OnceLock<Arc<ObjectSchema>> = OnceLock::new();

pub const PATH: &str = "v2/mobile-devices";

fn text(name: &str) -> AttributeDefinition {
    AttributeDefinition::new(name, FieldType::string())
}

/// Summary returned by the collection list.
pub fn summary_schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&SUMMARY, || {
        ObjectSchema::builder("MobileDevice")
            .collection()
            .attribute(
                AttributeDefinition::new("id", FieldType::jamf_id())
                    .readonly()
                    .identifier(IdentifierKind::Primary),
            )
            .attribute(text("name").identifier(IdentifierKind::Secondary))
            .attribute(
                text("serialNumber")
                    .readonly()
                    .identifier(IdentifierKind::Secondary),
            )
            .attribute(
                AttributeDefinition::new("udid", FieldType::udid())
                    .readonly()
                    .identifier(IdentifierKind::Secondary),
            )
            .attribute(
                text("wifiMacAddress")
                    .readonly()
                    .validator(validation::MAC_ADDRESS),
            )
            .attribute(text("phoneNumber").readonly())
            .attribute(text("model").readonly())
            .attribute(text("modelIdentifier").readonly())
            .attribute(text("username").readonly())
            .attribute(text("type").readonly())
            .attribute(text("managementId").readonly())
            .build()
    })
}

/// User and site assignment inside the details record.
pub fn location_schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&LOCATION, || {
        ObjectSchema::builder("MobileDeviceLocation")
            .attribute(text("username"))
            .attribute(text("realName"))
            .attribute(text("emailAddress").validator(validation::EMAIL_ADDRESS))
            .attribute(text("position"))
            .attribute(text("phoneNumber"))
            .attribute(AttributeDefinition::new("departmentId", FieldType::id_reference("Department")))
            .attribute(AttributeDefinition::new("buildingId", FieldType::id_reference("Building")))
            .attribute(text("room"))
            .build()
    })
}

/// Full record from the detail endpoint.
pub fn details_schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&DETAILS, build_details_schema)
}

fn build_details_schema() -> ModelResult<ObjectSchema> {
    ObjectSchema::builder("MobileDeviceDetails")
        .extendable()
        .attribute(
            AttributeDefinition::new("id", FieldType::jamf_id())
                .readonly()
                .identifier(IdentifierKind::Primary),
        )
        .attribute(text("name"))
        .attribute(text("assetTag"))
        .attribute(text("serialNumber").readonly())
        .attribute(AttributeDefinition::new("udid", FieldType::udid()).readonly())
        .attribute(text("osVersion").readonly())
        .attribute(text("osBuild").readonly())
        .attribute(
            text("ipAddress")
                .readonly()
                .validator(validation::IP_ADDRESS),
        )
        .attribute(AttributeDefinition::new("managed", FieldType::boolean()).readonly())
        .attribute(AttributeDefinition::new("supervised", FieldType::boolean()).readonly())
        .attribute(
            AttributeDefinition::new("lastInventoryUpdateTimestamp", FieldType::timestamp())
                .readonly(),
        )
        .attribute(
            AttributeDefinition::new("enforceName", FieldType::boolean())
                .alias("enforceNameEnabled"),
        )
        .attribute(AttributeDefinition::new(
            "location",
            FieldType::nested(location_schema()?),
        ))
        .attribute(
            AttributeDefinition::new("groupIds", FieldType::id_reference("MobileDeviceGroup"))
                .multi()
                .readonly(),
        )
        .build()
}

/// A mobile device summary with on-demand details.
#[derive(Debug, Clone)]
pub struct MobileDevice {
    summary: ModelObject,
    details: Option<ModelObject>,
}

impl MobileDevice {
    pub fn collection(config: ModelConfig) -> ModelResult<Collection> {
        Ok(Collection::with_config(summary_schema()?, PATH, config))
    }

    /// Wrap a summary object from the collection.
    pub fn from_summary(summary: ModelObject) -> ModelResult<Self> {
        if summary.kind() != "MobileDevice" {
            return Err(ModelError::invalid_data(format!(
                "Expected a MobileDevice summary, got {}",
                summary.kind()
            )));
        }
        Ok(Self {
            summary,
            details: None,
        })
    }

    pub fn parse(payload: &Value) -> ModelResult<Self> {
        Self::from_summary(ModelObject::parse(summary_schema()?, payload)?)
    }

    pub fn id(&self) -> ModelResult<&str> {
        self.summary
            .primary_id()
            .ok_or_else(|| ModelError::missing_data("Mobile device has no id"))
    }

    pub fn name(&self) -> ModelResult<Option<&str>> {
        self.summary.get_str("name")
    }

    pub fn serial_number(&self) -> ModelResult<Option<&str>> {
        self.summary.get_str("serialNumber")
    }

    pub fn udid(&self) -> ModelResult<Option<&str>> {
        self.summary.get_str("udid")
    }

    pub fn summary(&self) -> &ModelObject {
        &self.summary
    }

    /// Whether details have been fetched.
    pub fn details_loaded(&self) -> bool {
        self.details.is_some()
    }

    /// The detail record, fetched on first use.
    pub fn details<C: Connection + ?Sized>(&mut self, conn: &C) -> ModelResult<&mut ModelObject> {
        let details = match self.details.take() {
            Some(details) => details,
            None => self.fetch_details(conn)?,
        };
        Ok(self.details.insert(details))
    }

    /// Drop cached details so the next access fetches them again.
    pub fn reload_details(&mut self) {
        self.details = None;
    }

    /// PATCH pending detail changes. Nothing is sent when there are none.
    pub fn save_details<C: Connection + ?Sized>(&mut self, conn: &C) -> ModelResult<()> {
        let path = format!("{}/{}", PATH, self.id()?);
        let Some(details) = self.details.as_mut() else {
            return Ok(());
        };
        if !details.has_unsaved_changes() {
            return Ok(());
        }
        conn.patch(&path, &details.to_wire_changes_only())?;
        details.clear_unsaved_changes();
        Ok(())
    }

    /// Scope evaluation facts from the detail record.
    pub fn scope_subject<C: Connection + ?Sized>(&mut self, conn: &C) -> ModelResult<ScopeSubject> {
        let id = parse_u64(self.id()?).ok_or_else(|| {
            ModelError::invalid_data("Mobile device id is not numeric")
        })?;
        let details = self.details(conn)?;
        let mut subject = ScopeSubject::new(id);
        subject.managed = details.get_bool("managed")?.unwrap_or(false);
        subject.group_ids = details
            .get_list("groupIds")?
            .iter()
            .filter_map(|g| g.as_str().and_then(parse_u64))
            .collect();
        subject.ip_address = details
            .get_str("ipAddress")?
            .and_then(|ip| ip.parse::<IpAddr>().ok());
        if let Some(location) = details.get_object("location")? {
            subject.building_id = location.get_str("buildingId")?.and_then(parse_u64);
            subject.department_id = location.get_str("departmentId")?.and_then(parse_u64);
            subject.username = location
                .get_str("username")?
                .filter(|u| !u.is_empty())
                .map(str::to_string);
        }
        Ok(subject)
    }

    fn fetch_details<C: Connection + ?Sized>(&self, conn: &C) -> ModelResult<ModelObject> {
        let path = format!("{}/{}/detail", PATH, self.id()?);
        debug!("Fetching mobile device details from {}", path);
        let payload = conn.get(&path)?;
        ModelObject::parse(details_schema()?, &payload)
    }
}

fn parse_u64(text: &str) -> Option<u64> {
    text.trim().parse().ok()
}
