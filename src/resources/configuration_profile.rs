//! Classic macOS configuration profiles and their scope.
//!
//! Read as JSON from `JSSResource/osxconfigurationprofiles/id/{id}` and
//! written back as XML. The `general` section is a [`ModelObject`]; the
//! `scope` section is a [`Scope`] owned by the profile, so scope edits make
//! the profile need a save.
//!
//! Profiles are one of the owners whose classic endpoint drops user and user
//! group targets and exclusions; saving such a scope logs a warning unless
//! [`ScopeConfig::suppress_data_loss_warning`] is set.

use super::computer_group::site_schema;
use super::shared_schema;
use crate::config::ScopeConfig;
use crate::error::{ModelError, ModelResult};
use crate::object::ModelObject;
use crate::resource::Connection;
use crate::schema::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema};
use crate::scope::{Scope, ScopeOwner, TargetKind};
use crate::xml::XmlElement;

use log::{debug, info};
use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};

static SCHEMA: OnceLock<Arc<ObjectSchema>> = OnceLock::new();

pub const PATH: &str = "JSSResource/osxconfigurationprofiles";

const WRAPPER: &str = "os_x_configuration_profile";

pub const DISTRIBUTION_METHODS: [&str; 2] =
    ["Install Automatically", "Make Available in Self Service"];

/// The `general` section.
pub fn schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&SCHEMA, || {
        ObjectSchema::builder("ConfigurationProfile")
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
            .attribute(AttributeDefinition::new("description", FieldType::string()))
            .attribute(
                AttributeDefinition::new("distribution_method", FieldType::string())
                    .enum_values(DISTRIBUTION_METHODS),
            )
            .attribute(AttributeDefinition::new("user_removable", FieldType::boolean()))
            .attribute(AttributeDefinition::new("site", FieldType::nested(site_schema()?)))
            .attribute(AttributeDefinition::new("payloads", FieldType::string()))
            .build()
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationProfile {
    general: ModelObject,
    scope: Scope,
}

impl ConfigurationProfile {
    /// An unsaved profile with an empty scope.
    pub fn create(name: &str, config: ScopeConfig) -> ModelResult<Self> {
        let general = ModelObject::create(schema()?, &json!({ "name": name }))?;
        Ok(Self {
            general,
            scope: empty_scope(config),
        })
    }

    /// Parse a classic payload, with or without the wrapper.
    pub fn parse(payload: &Value, config: ScopeConfig) -> ModelResult<Self> {
        let body = payload.get(WRAPPER).unwrap_or(payload);
        let general = body
            .get("general")
            .ok_or_else(|| ModelError::invalid_data("Configuration profile has no general section"))?;
        let general = ModelObject::parse(schema()?, general)?;
        let scope = match body.get("scope") {
            Some(raw) => Scope::from_classic(TargetKind::Computers, config, raw)?
                .with_owner(ScopeOwner::ConfigurationProfile),
            None => empty_scope(config),
        };
        Ok(Self { general, scope })
    }

    pub fn fetch<C: Connection + ?Sized>(conn: &C, id: &str, config: ScopeConfig) -> ModelResult<Self> {
        Self::parse(&conn.get(&format!("{}/id/{}", PATH, id))?, config)
    }

    pub fn id(&self) -> Option<&str> {
        self.general.primary_id()
    }

    pub fn name(&self) -> ModelResult<&str> {
        Ok(self.general.get_str("name")?.unwrap_or_default())
    }

    pub fn set_name(&mut self, name: &str) -> ModelResult<()> {
        self.general.set("name", name)
    }

    pub fn description(&self) -> ModelResult<Option<&str>> {
        self.general.get_str("description")
    }

    pub fn set_description(&mut self, description: &str) -> ModelResult<()> {
        self.general.set("description", description)
    }

    pub fn general(&self) -> &ModelObject {
        &self.general
    }

    pub fn general_mut(&mut self) -> &mut ModelObject {
        &mut self.general
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// General changes or scope edits are pending.
    pub fn needs_update(&self) -> bool {
        self.general.has_unsaved_changes() || self.scope.needs_update()
    }

    /// `<os_x_configuration_profile>` element for classic writes.
    pub fn to_xml(&self) -> ModelResult<XmlElement> {
        let mut general = XmlElement::new("general").child(XmlElement::with_text("name", self.name()?));
        for key in ["description", "distribution_method", "payloads"] {
            if let Some(text) = self.general.get_str(key)? {
                general.push(XmlElement::with_text(key, text));
            }
        }
        if let Some(removable) = self.general.get("user_removable")?.as_json().and_then(Value::as_bool) {
            general.push(XmlElement::with_text("user_removable", removable));
        }
        if let Some(id) = self
            .general
            .get_object("site")?
            .map(|site| site.get_str("id"))
            .transpose()?
            .flatten()
        {
            general.push(XmlElement::new("site").child(XmlElement::with_text("id", id)));
        }
        Ok(XmlElement::new(WRAPPER)
            .child(general)
            .child(self.scope.to_xml()))
    }

    /// Write the profile if anything changed; returns its id.
    pub fn save<C: Connection + ?Sized>(&mut self, conn: &C) -> ModelResult<String> {
        self.general.validate_for_save()?;
        if let Some(id) = self.id().map(str::to_string) {
            if !self.needs_update() {
                debug!("Configuration profile {} has no changes to save", id);
                return Ok(id);
            }
            conn.put_xml(&format!("{}/id/{}", PATH, id), &self.to_xml()?.to_document())?;
            self.mark_saved();
            info!("Updated configuration profile {}", id);
            return Ok(id);
        }
        let response = conn.post_xml(&format!("{}/id/0", PATH), &self.to_xml()?.to_document())?;
        let id = created_id(&response).ok_or_else(|| {
            ModelError::invalid_data(format!(
                "Configuration profile create response has no id: {}",
                response
            ))
        })?;
        self.general.assign_primary_id(&id)?;
        self.mark_saved();
        info!("Created configuration profile {}", id);
        Ok(id)
    }

    fn mark_saved(&mut self) {
        self.general.clear_unsaved_changes();
        self.scope.clear_needs_update();
    }
}

fn empty_scope(config: ScopeConfig) -> Scope {
    Scope::new(TargetKind::Computers, config).with_owner(ScopeOwner::ConfigurationProfile)
}

fn created_id(response: &Value) -> Option<String> {
    let body = response.get(WRAPPER).unwrap_or(response);
    match body.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
