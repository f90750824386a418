//! Object-model behaviour through the public API: schema registration,
//! change tracking, wire mapping and required-field enforcement.

mod common;

use common::{MockConnection, init_logging, json_body};
use mdm_objects::error::ErrorKind;
use mdm_objects::object::{Change, FieldValue, ModelObject, UnsavedChange};
use mdm_objects::resources::{self, Building, InventoryPreloadRecord, building, inventory_preload};
use mdm_objects::schema::{AttributeDefinition, FieldType, ObjectSchema, SchemaRegistry};
use mdm_objects::{Collection, ModelConfig};
use serde_json::json;
use std::sync::Arc;

fn tagged_schema() -> Arc<ObjectSchema> {
    Arc::new(
        ObjectSchema::builder("Tagged")
            .attribute(AttributeDefinition::new("name", FieldType::string()))
            .attribute(AttributeDefinition::new("tags", FieldType::string()).multi())
            .build()
            .unwrap(),
    )
}

#[test]
fn test_schema_registration_is_idempotent() {
    let registry = SchemaRegistry::new();
    resources::register_all(&registry).unwrap();
    let count = registry.len();
    resources::register_all(&registry).unwrap();
    assert_eq!(registry.len(), count);

    let first = registry.require("Building").unwrap();
    let second = building::schema().unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    // same accessor behaviour either way
    let a = ModelObject::parse(first, &json!({"id": 1, "name": "HQ"})).unwrap();
    let b = ModelObject::parse(second, &json!({"id": 1, "name": "HQ"})).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.get_str("name").unwrap(), Some("HQ"));
}

#[test]
fn test_setting_current_value_records_nothing() {
    let mut building = Building::parse(&json!({"id": "5", "name": "foo"})).unwrap();
    building.set_name("foo").unwrap();
    assert!(building.object().unsaved_changes().is_empty());
    assert!(!building.object().has_unsaved_changes());

    building.set_name("bar").unwrap();
    building.set_name("foo").unwrap();
    // the entry stays, with the original old value
    let changes = building.object().unsaved_changes();
    let change = changes["name"].as_change().unwrap();
    assert_eq!(change.old, FieldValue::from("foo"));
    assert_eq!(change.new, FieldValue::from("foo"));
}

#[test]
fn test_building_round_trip() {
    let wire = json!({"id": 5, "name": "Building A", "city": "NY"});
    let building = Building::parse(&wire).unwrap();
    assert_eq!(building.id(), Some("5"));

    let out = building.object().to_wire();
    assert_eq!(out["id"], json!("5"));
    assert_eq!(out["name"], json!("Building A"));
    assert_eq!(out["city"], json!("NY"));

    let again = Building::parse(&out).unwrap();
    assert_eq!(again, building);
}

#[test]
fn test_list_append_tracks_prior_snapshot() {
    let mut object = ModelObject::parse(tagged_schema(), &json!({"name": "x"})).unwrap();
    assert!(object.get_list("tags").unwrap().is_empty());

    object.append("tags", "x").unwrap();
    object.append("tags", "y").unwrap();

    let tags: Vec<&str> = object
        .get_list("tags")
        .unwrap()
        .iter()
        .filter_map(FieldValue::as_str)
        .collect();
    assert_eq!(tags, ["x", "y"]);

    let changes = object.unsaved_changes();
    assert_eq!(
        changes["tags"],
        UnsavedChange::Value(Change {
            old: FieldValue::List(vec![]),
            new: FieldValue::List(vec!["x".into(), "y".into()]),
        })
    );
    assert_eq!(object.to_wire_changes_only(), json!({"tags": ["x", "y"]}));
}

#[test]
fn test_inventory_preload_required_fields() {
    init_logging();
    let conn = MockConnection::new()
        .respond("GET v2/inventory-preload/records", json!({"totalCount": 0, "results": []}))
        .respond("POST v2/inventory-preload/records", json!({"id": "9", "href": "/v2/inventory-preload/records/9"}));
    let collection = InventoryPreloadRecord::collection(ModelConfig::default()).unwrap();

    let err = InventoryPreloadRecord::create(&json!({"serialNumber": "C02ABC", "deviceType": "Toaster"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    let mut record = InventoryPreloadRecord::create(&json!({"deviceType": "Computer"})).unwrap();
    let err = record.save(&conn, &collection).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingData);
    assert!(conn.requests_for("POST").is_empty());

    assert_eq!(
        record.set_device_type("Tablet").unwrap_err().kind(),
        ErrorKind::InvalidData
    );
    assert_eq!(record.device_type().unwrap(), Some("Computer"));

    record.set_serial_number("C02ABC").unwrap();
    let id = record.save(&conn, &collection).unwrap();
    assert_eq!(id, "9");
    assert_eq!(record.id(), Some("9"));
    assert!(!record.object().has_unsaved_changes());

    let posts = conn.requests_for("POST");
    assert_eq!(posts.len(), 1);
    let body = json_body(&posts[0]);
    assert_eq!(body["serialNumber"], json!("C02ABC"));
    assert_eq!(body["deviceType"], json!("Computer"));
}

#[test]
fn test_inventory_preload_field_formats() {
    let mut record = InventoryPreloadRecord::create(&json!({
        "serialNumber": "C02ABC",
        "deviceType": "Mobile Device"
    }))
    .unwrap();
    let object = record.object_mut();
    assert_eq!(
        object.set("emailAddress", "not an address").unwrap_err().kind(),
        ErrorKind::InvalidData
    );
    assert_eq!(
        object.set("poDate", "03/01/2024").unwrap_err().kind(),
        ErrorKind::InvalidData
    );
    object.set("poDate", "2024-03-01").unwrap();
    object.set("emailAddress", "it@example.com").unwrap();
    object.set("lifeExpectancy", 4).unwrap();
    assert_eq!(object.get_i64("lifeExpectancy").unwrap(), Some(4));
    assert_eq!(
        object.set("serialNumber", "").unwrap_err().kind(),
        ErrorKind::MissingData
    );
}

#[test]
fn test_unknown_attribute_is_unsupported() {
    let mut building = Building::create("Depot").unwrap();
    let err = building.object_mut().set("floors", 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    let err = ModelObject::create(building::schema().unwrap(), &json!({"floors": 3})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_readonly_id_cannot_be_set() {
    let mut building = Building::parse(&json!({"id": "5", "name": "HQ"})).unwrap();
    let err = building.object_mut().set("id", "6").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert_eq!(building.id(), Some("5"));
}

#[test]
fn test_collection_update_sends_changes_only() {
    let conn = MockConnection::new()
        .respond("GET v1/buildings", common::building_list())
        .respond(
            "GET v1/buildings/1",
            json!({"id": "1", "name": "Headquarters", "city": "Eau Claire"}),
        );
    let collection = Collection::new(building::schema().unwrap(), building::PATH);

    let mut hq = collection.fetch_by_identifier(&conn, "headquarters").unwrap();
    hq.set("city", "Chippewa Falls").unwrap();
    collection.save(&conn, &mut hq).unwrap();

    let patches = conn.requests_for("PATCH");
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].path, "v1/buildings/1");
    assert_eq!(json_body(&patches[0]), json!({"city": "Chippewa Falls"}));
    assert!(!hq.has_unsaved_changes());
}

#[test]
fn test_preload_schema_is_extendable() {
    let record = InventoryPreloadRecord::parse(&json!({
        "id": "3",
        "serialNumber": "C02XYZ",
        "deviceType": "Computer",
        "extensionAttributes": [{"name": "Asset Owner", "value": "IT"}]
    }))
    .unwrap();
    let eas = record.object().extension_attributes().unwrap();
    assert_eq!(eas.value("Asset Owner"), Some(&json!("IT")));
    assert!(inventory_preload::schema().unwrap().is_extendable());
}
