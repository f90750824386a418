//! Typed wrappers for a handful of API resources.
//!
//! Each wrapper owns a [`ModelObject`](crate::object::ModelObject) built from a
//! static schema and adds accessors with Rust types. Schemas are built on
//! first use and shared afterwards.

pub mod building;
pub mod computer_group;
pub mod configuration_profile;
pub mod department;
pub mod inventory_preload;
pub mod mobile_device;

pub use building::Building;
pub use computer_group::ComputerGroup;
pub use configuration_profile::ConfigurationProfile;
pub use department::Department;
pub use inventory_preload::InventoryPreloadRecord;
pub use mobile_device::MobileDevice;

use crate::error::ModelResult;
use crate::schema::{ObjectSchema, SchemaRegistry};

use std::sync::{Arc, OnceLock};

/// Build a schema once and hand out the shared copy afterwards.
pub(crate) fn shared_schema(
    cell: &'static OnceLock<Arc<ObjectSchema>>,
    build: fn() -> ModelResult<ObjectSchema>,
) -> ModelResult<Arc<ObjectSchema>> {
    if let Some(schema) = cell.get() {
        return Ok(Arc::clone(schema));
    }
    let built = Arc::new(build()?);
    Ok(Arc::clone(cell.get_or_init(|| built)))
}

/// Register every bundled schema, nested ones included.
///
/// Safe to call repeatedly; later calls return without changes.
pub fn register_all(registry: &SchemaRegistry) -> ModelResult<()> {
    for schema in [
        building::schema()?,
        department::schema()?,
        inventory_preload::schema()?,
        mobile_device::summary_schema()?,
        mobile_device::details_schema()?,
        mobile_device::location_schema()?,
        computer_group::schema()?,
        computer_group::site_schema()?,
        computer_group::member_schema()?,
        configuration_profile::schema()?,
    ] {
        registry.register_shared(schema);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_is_idempotent() {
        let registry = SchemaRegistry::new();
        register_all(&registry).unwrap();
        let count = registry.len();
        let building = registry.require("Building").unwrap();

        register_all(&registry).unwrap();
        assert_eq!(registry.len(), count);
        assert!(Arc::ptr_eq(&building, &registry.require("Building").unwrap()));
        assert!(Arc::ptr_eq(&building, &building::schema().unwrap()));
    }
}
