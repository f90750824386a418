//! Declarative attribute schemas and the validation engine.
//!
//! # Key Types
//!
//! - [`ObjectSchema`] - ordered attribute table for one object kind
//! - [`AttributeDefinition`] - one attribute's type and flags
//! - [`SchemaRegistry`] - idempotent registry of schemas by kind name
//!
//! # Examples
//!
//! ```rust
//! use mdm_objects::schema::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema, SchemaRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = ObjectSchema::builder("Department")
//!     .collection()
//!     .attribute(
//!         AttributeDefinition::new("id", FieldType::jamf_id())
//!             .readonly()
//!             .identifier(IdentifierKind::Primary),
//!     )
//!     .attribute(AttributeDefinition::new("name", FieldType::string()).required())
//!     .build()?;
//!
//! let registry = SchemaRegistry::new();
//! let first = registry.register(schema.clone());
//! let second = registry.register(schema);
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! # Ok(())
//! # }
//! ```

pub mod registry;
pub mod types;
pub mod validation;


pub use registry::SchemaRegistry;
pub use types::{
    AttributeDefinition, FieldType, IdentifierKind, ObjectSchema, ObjectSchemaBuilder,
    PrimitiveKind,
};
pub use validation::NamedValidator;
