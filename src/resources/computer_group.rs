//! Classic computer groups, static or smart.
//!
//! Read as JSON from `JSSResource/computergroups/id/{id}` and written back as
//! XML. Smart groups carry a [`Criteria`] list; static groups carry explicit
//! members.

use super::shared_schema;
use crate::criteria::Criteria;
use crate::error::{ModelError, ModelResult};
use crate::object::ModelObject;
use crate::resource::Connection;
use crate::schema::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema};
use crate::xml::XmlElement;

use log::{debug, info};
use serde_json::{Value, json};
use std::sync::{Arc, OnceLock};

static SCHEMA: OnceLock<Arc<ObjectSchema>> = OnceLock::new();
static SITE: OnceLock<Arc<ObjectSchema>> = OnceLock::new();
static MEMBER: OnceLock<Arc<ObjectSchema>> = OnceLock::new();

pub const PATH: &str = "JSSResource/computergroups";

const WRAPPER: &str = "computer_group";

/// Site assignment, `-1` meaning none.
pub fn site_schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&SITE, || {
        ObjectSchema::builder("Site")
            .attribute(AttributeDefinition::new("id", FieldType::jamf_id()))
            .attribute(AttributeDefinition::new("name", FieldType::string()))
            .build()
    })
}

/// One static member.
pub fn member_schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&MEMBER, || {
        ObjectSchema::builder("ComputerGroupMember")
            .attribute(AttributeDefinition::new("id", FieldType::jamf_id()).required())
            .attribute(AttributeDefinition::new("name", FieldType::string()))
            .attribute(AttributeDefinition::new("serial_number", FieldType::string()))
            .build()
    })
}

pub fn schema() -> ModelResult<Arc<ObjectSchema>> {
    shared_schema(&SCHEMA, || {
        ObjectSchema::builder("ComputerGroup")
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
            .attribute(AttributeDefinition::new("is_smart", FieldType::boolean()))
            .attribute(AttributeDefinition::new("site", FieldType::nested(site_schema()?)))
            .attribute(
                AttributeDefinition::new("computers", FieldType::nested(member_schema()?)).multi(),
            )
            .build()
    })
}

/// A computer group and its criteria.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputerGroup {
    object: ModelObject,
    criteria: Criteria,
}

impl ComputerGroup {
    /// An unsaved group.
    pub fn create(name: &str, is_smart: bool) -> ModelResult<Self> {
        let object = ModelObject::create(schema()?, &json!({ "name": name, "is_smart": is_smart }))?;
        Ok(Self {
            object,
            criteria: Criteria::default(),
        })
    }

    /// Parse a classic payload, with or without the `computer_group` wrapper.
    pub fn parse(payload: &Value) -> ModelResult<Self> {
        let body = payload.get(WRAPPER).unwrap_or(payload);
        let object = ModelObject::parse(schema()?, body)?;
        let criteria = Criteria::from_classic(body.get("criteria").unwrap_or(&Value::Null))?;
        Ok(Self { object, criteria })
    }

    /// Fetch one group by id.
    pub fn fetch<C: Connection + ?Sized>(conn: &C, id: &str) -> ModelResult<Self> {
        Self::parse(&conn.get(&format!("{}/id/{}", PATH, id))?)
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

    pub fn is_smart(&self) -> ModelResult<bool> {
        self.object.is("is_smart")
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Mutable criteria of a smart group.
    pub fn criteria_mut(&mut self) -> ModelResult<&mut Criteria> {
        if !self.is_smart()? {
            return Err(ModelError::unsupported("Static groups have no criteria"));
        }
        Ok(&mut self.criteria)
    }

    /// Ids of the explicit members.
    pub fn member_ids(&self) -> ModelResult<Vec<&str>> {
        let mut ids = Vec::new();
        for member in self.object.get_list("computers")? {
            if let Some(id) = member.as_object().map(|m| m.get_str("id")).transpose()?.flatten() {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Add a member to a static group; adding an existing member does nothing.
    pub fn add_member(&mut self, id: u64) -> ModelResult<()> {
        self.ensure_static()?;
        let id = id.to_string();
        if self.member_ids()?.contains(&id.as_str()) {
            return Ok(());
        }
        self.object.append("computers", json!({ "id": id }))
    }

    /// Remove a member from a static group; returns whether it was present.
    pub fn remove_member(&mut self, id: u64) -> ModelResult<bool> {
        self.ensure_static()?;
        let id = id.to_string();
        let removed = self.object.delete_if("computers", |member| {
            member
                .as_object()
                .and_then(|m| m.get_str("id").ok().flatten())
                .is_some_and(|m| m == id)
        })?;
        Ok(removed > 0)
    }

    /// Own attribute changes or criteria edits are pending.
    pub fn needs_update(&self) -> bool {
        self.object.has_unsaved_changes() || self.criteria.needs_update()
    }

    /// `<computer_group>` element for classic writes.
    pub fn to_xml(&self) -> ModelResult<XmlElement> {
        let mut xml = XmlElement::new(WRAPPER)
            .child(XmlElement::with_text("name", self.name()?))
            .child(XmlElement::with_text("is_smart", self.is_smart()?));
        if let Some(site) = self.object.get_object("site")? {
            let mut site_xml = XmlElement::new("site");
            if let Some(id) = site.get_str("id")? {
                site_xml.push(XmlElement::with_text("id", id));
            }
            if let Some(name) = site.get_str("name")? {
                site_xml.push(XmlElement::with_text("name", name));
            }
            xml.push(site_xml);
        }
        if self.is_smart()? {
            xml.push(self.criteria.to_xml());
        } else {
            let mut computers = XmlElement::new("computers");
            for id in self.member_ids()? {
                computers.push(XmlElement::new("computer").child(XmlElement::with_text("id", id)));
            }
            xml.push(computers);
        }
        Ok(xml)
    }

    /// Write the group if anything changed; returns its id.
    pub fn save<C: Connection + ?Sized>(&mut self, conn: &C) -> ModelResult<String> {
        self.object.validate_for_save()?;
        if let Some(id) = self.id().map(str::to_string) {
            if !self.needs_update() {
                debug!("Computer group {} has no changes to save", id);
                return Ok(id);
            }
            conn.put_xml(&format!("{}/id/{}", PATH, id), &self.to_xml()?.to_document())?;
            self.mark_saved();
            info!("Updated computer group {}", id);
            return Ok(id);
        }
        let response = conn.post_xml(&format!("{}/id/0", PATH), &self.to_xml()?.to_document())?;
        let id = created_id(&response).ok_or_else(|| {
            ModelError::invalid_data(format!("Computer group create response has no id: {}", response))
        })?;
        self.object.assign_primary_id(&id)?;
        self.mark_saved();
        info!("Created computer group {}", id);
        Ok(id)
    }

    pub fn object(&self) -> &ModelObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut ModelObject {
        &mut self.object
    }

    fn ensure_static(&self) -> ModelResult<()> {
        if self.is_smart()? {
            return Err(ModelError::unsupported(
                "Smart group membership comes from its criteria",
            ));
        }
        Ok(())
    }

    fn mark_saved(&mut self) {
        self.object.clear_unsaved_changes();
        self.criteria.clear_needs_update();
    }
}

fn created_id(response: &Value) -> Option<String> {
    let body = response.get(WRAPPER).unwrap_or(response);
    match body.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
