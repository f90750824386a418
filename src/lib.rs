//! Object model, change tracking and scope evaluation for device-management
//! REST API clients.
//!
//! Resources are described by declarative schemas; a generic engine derives
//! validated accessors, list mutation, unsaved-change tracking and wire
//! mapping from them. A separate engine maintains and evaluates the
//! targets, limitations and exclusions that scope policies and profiles.
//!
//! # Core Components
//!
//! - [`ObjectSchema`] / [`SchemaRegistry`] - declarative attribute tables
//! - [`ModelObject`] - one schema-driven object with its change ledger
//! - [`Scope`] - scope mutation and `in_scope` evaluation
//! - [`Criteria`] - smart-group rule lists
//! - [`Collection`] - fetch, create, update and delete over a [`Connection`]
//!
//! # Quick Start
//!
//! ```rust
//! use mdm_objects::resources::Building;
//! use serde_json::json;
//!
//! # fn main() -> Result<(), mdm_objects::ModelError> {
//! let mut building = Building::parse(&json!({"id": "5", "name": "Building A", "city": "NY"}))?;
//! building.set_city("Boston")?;
//! assert_eq!(building.object().to_wire_changes_only(), json!({"city": "Boston"}));
//! # Ok(())
//! # }
//! ```
//!
//! HTTP transport is out of scope: callers implement [`Connection`] and
//! [`ScopeDirectory`](scope::ScopeDirectory) over their own client.

pub mod config;
pub mod criteria;
pub mod error;
pub mod object;
pub mod resource;
pub mod resources;
pub mod schema;
pub mod scope;
pub mod xml;

pub use config::{ModelConfig, ScopeConfig};
pub use criteria::{AndOr, Criteria, Criterion, SearchType};
pub use error::{ErrorKind, ModelError, ModelResult};
pub use object::{FieldValue, ModelObject, UnsavedChange};
pub use resource::{Collection, Connection};
pub use schema::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema, SchemaRegistry};
pub use scope::{Scope, ScopeKey, ScopeSubject, TargetKind};
pub use xml::XmlElement;
