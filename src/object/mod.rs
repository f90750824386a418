//! The object-model engine.
//!
//! Given an [`ObjectSchema`](crate::schema::ObjectSchema), a [`ModelObject`]
//! provides getters for every attribute (and alias), validated setters,
//! list mutators for multi-valued attributes, an unsaved-changes ledger, and
//! mapping to and from the wire format.
//!
//! # Lifecycle
//!
//! - [`ModelObject::parse`] builds a pristine object from server data.
//! - [`ModelObject::create`] builds a new object whose every field is an
//!   unsaved change.
//! - Setters move the object to dirty; [`ModelObject::clear_unsaved_changes`]
//!   returns it to pristine after a successful save.
//!
//! ```rust
//! use mdm_objects::object::ModelObject;
//! use mdm_objects::schema::{AttributeDefinition, FieldType, ObjectSchema};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Arc::new(
//!     ObjectSchema::builder("Site")
//!         .attribute(AttributeDefinition::new("name", FieldType::string()))
//!         .build()?,
//! );
//! let mut site = ModelObject::parse(schema, &json!({"name": "Main"}))?;
//! site.set("name", "Branch")?;
//! assert!(site.has_unsaved_changes());
//! assert_eq!(site.to_wire_changes_only(), json!({"name": "Branch"}));
//! # Ok(())
//! # }
//! ```

pub mod changes;
pub mod extension;
pub mod model;
pub mod value;
mod wire;

#[cfg(test)]
mod tests;

pub use changes::{Change, ChangeLedger, UnsavedChange};
pub use extension::{ExtensionAttribute, ExtensionAttributes, ExtensionDataType};
pub use model::{KnownIdentifiers, ModelObject};
pub use value::FieldValue;
