//! Tests for accessors, setters, list mutation and change tracking.

use super::*;
use crate::error::ErrorKind;
use crate::schema::types::{AttributeDefinition, FieldType, IdentifierKind, ObjectSchema};
use crate::schema::validation;
use serde_json::{Value, json};
use std::sync::Arc;

fn location_schema() -> Arc<ObjectSchema> {
    Arc::new(
        ObjectSchema::builder("Location")
            .attribute(AttributeDefinition::new("username", FieldType::string()))
            .attribute(
                AttributeDefinition::new("emailAddress", FieldType::string())
                    .validator(validation::EMAIL_ADDRESS),
            )
            .attribute(AttributeDefinition::new("buildingId", FieldType::id_reference("Building")))
            .build()
            .expect("Failed to build schema"),
    )
}

fn device_schema() -> Arc<ObjectSchema> {
    Arc::new(
        ObjectSchema::builder("Device")
            .collection()
            .attribute(
                AttributeDefinition::new("id", FieldType::jamf_id())
                    .readonly()
                    .identifier(IdentifierKind::Primary),
            )
            .attribute(
                AttributeDefinition::new("name", FieldType::string())
                    .required()
                    .identifier(IdentifierKind::Secondary)
                    .alias("displayName"),
            )
            .attribute(AttributeDefinition::new("managed", FieldType::boolean()))
            .attribute(
                AttributeDefinition::new("platform", FieldType::string())
                    .enum_values(["Mac", "iOS", "tvOS"]),
            )
            .attribute(
                AttributeDefinition::new("tags", FieldType::string())
                    .multi()
                    .max_items(3),
            )
            .attribute(AttributeDefinition::new("location", FieldType::nested(location_schema())))
            .attribute(
                AttributeDefinition::new("contacts", FieldType::nested(location_schema())).multi(),
            )
            .build()
            .expect("Failed to build schema"),
    )
}

fn parsed_device() -> ModelObject {
    ModelObject::parse(
        device_schema(),
        &json!({
            "id": 7,
            "name": "Lab Mac",
            "managed": true,
            "platform": "Mac",
            "tags": ["lab"],
            "location": {"username": "jdoe", "emailAddress": "jdoe@example.com", "buildingId": 3},
            "contacts": [{"username": "asmith"}],
            "somethingNew": "ignored"
        }),
    )
    .expect("Failed to parse device")
}

#[test]
fn test_parse_populates_values_without_changes() {
    let device = parsed_device();
    assert_eq!(device.primary_id(), Some("7"));
    assert_eq!(device.get_str("name").unwrap(), Some("Lab Mac"));
    assert_eq!(device.get_str("displayName").unwrap(), Some("Lab Mac"));
    assert!(device.is("managed").unwrap());
    assert_eq!(device.get_list("tags").unwrap(), &[FieldValue::from("lab")]);

    let location = device.get_object("location").unwrap().unwrap();
    assert_eq!(location.get_str("buildingId").unwrap(), Some("3"));
    assert!(!device.has_unsaved_changes());
}

#[test]
fn test_parse_missing_required_is_invalid_data() {
    let err = ModelObject::parse(device_schema(), &json!({"id": 1})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_parse_absent_list_is_empty_and_absent_single_is_null() {
    let device = ModelObject::parse(device_schema(), &json!({"name": "Bare"})).unwrap();
    assert!(device.get_list("tags").unwrap().is_empty());
    assert!(device.get("platform").unwrap().is_null());
}

#[test]
fn test_parse_rejects_bad_enum() {
    let err = ModelObject::parse(device_schema(), &json!({"name": "x", "platform": "Windows"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_setter_records_change() {
    let mut device = parsed_device();
    device.set("name", "Lab Mac 2").unwrap();
    device.set("name", "Lab Mac 3").unwrap();

    let changes = device.unsaved_changes();
    assert_eq!(
        changes["name"].to_json(),
        json!({"old": "Lab Mac", "new": "Lab Mac 3"})
    );
}

#[test]
fn test_setter_same_value_is_no_op() {
    let mut device = parsed_device();
    device.set("name", "Lab Mac").unwrap();
    device.set("managed", "true").unwrap();
    assert!(device.unsaved_changes().is_empty());
}

#[test]
fn test_setter_via_alias() {
    let mut device = parsed_device();
    device.set("displayName", "Renamed").unwrap();
    assert!(device.unsaved_changes().contains_key("name"));
}

#[test]
fn test_setter_failures_do_not_mutate() {
    let mut device = parsed_device();

    let err = device.set("platform", "Windows").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    let err = device.set("managed", "maybe").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    let err = device.set("name", "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingData);
    let err = device.set("id", "99").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    let err = device.set("colour", "red").unwrap_err();
    assert!(matches!(err, crate::error::ModelError::UnknownAttribute { .. }));

    assert_eq!(device.get_str("platform").unwrap(), Some("Mac"));
    assert!(!device.has_unsaved_changes());
}

#[test]
fn test_custom_validator_takes_priority() {
    let mut device = parsed_device();
    let location = device.get_object_mut("location").unwrap().unwrap();
    let err = location.set("emailAddress", "not-an-email").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_is_rejects_non_boolean() {
    let device = parsed_device();
    assert_eq!(device.is("name").unwrap_err().kind(), ErrorKind::Unsupported);
}

#[test]
fn test_list_mutations_track_prior_snapshot() {
    let mut device = ModelObject::parse(device_schema(), &json!({"name": "n"})).unwrap();
    device.append("tags", "x").unwrap();
    device.append("tags", "y").unwrap();

    assert_eq!(
        device.get_list("tags").unwrap(),
        &[FieldValue::from("x"), FieldValue::from("y")]
    );
    assert_eq!(
        device.unsaved_changes()["tags"].to_json(),
        json!({"old": [], "new": ["x", "y"]})
    );
}

#[test]
fn test_list_primitives() {
    let mut device = ModelObject::parse(device_schema(), &json!({"name": "n", "tags": ["b"]})).unwrap();
    device.prepend("tags", "a").unwrap();
    device.insert_at("tags", 2, "c").unwrap();
    assert_eq!(device.to_wire()["tags"], json!(["a", "b", "c"]));

    assert_eq!(device.delete_at("tags", 1).unwrap(), FieldValue::from("b"));
    assert_eq!(device.delete_value("tags", "c").unwrap(), 1);
    assert_eq!(device.delete_value("tags", "zzz").unwrap(), 0);
    assert_eq!(device.delete_if("tags", |v| v.as_str() == Some("a")).unwrap(), 1);
    assert!(device.get_list("tags").unwrap().is_empty());

    // the list ended where it started, but the ledger keeps the history
    assert_eq!(
        device.unsaved_changes()["tags"].to_json(),
        json!({"old": ["b"], "new": []})
    );
}

#[test]
fn test_list_constraints_are_checked_before_commit() {
    let mut device = ModelObject::parse(device_schema(), &json!({"name": "n"})).unwrap();
    device
        .replace_list("tags", vec![json!("a"), json!("b"), json!("c")])
        .unwrap();
    device.clear_unsaved_changes();

    let err = device.append("tags", "d").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_eq!(device.get_list("tags").unwrap().len(), 3);

    let err = device.insert_at("tags", 9, "z").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoSuchItem);
    let err = device.delete_at("tags", 9).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoSuchItem);
    assert!(!device.has_unsaved_changes());
}

#[test]
fn test_list_setter_rejects_single_value_api() {
    let mut device = parsed_device();
    assert_eq!(device.set("tags", "x").unwrap_err().kind(), ErrorKind::InvalidData);
    assert_eq!(device.append("name", "x").unwrap_err().kind(), ErrorKind::Unsupported);
}

#[test]
fn test_nested_changes_bubble_up_and_clear() {
    let mut device = parsed_device();
    device
        .get_object_mut("location")
        .unwrap()
        .unwrap()
        .set("username", "mroe")
        .unwrap();
    device
        .get_list_object_mut("contacts", 0)
        .unwrap()
        .unwrap()
        .set("username", "bsmith")
        .unwrap();

    assert!(device.has_unsaved_changes());
    let changes = device.unsaved_changes();
    let location = changes["location"].as_nested().unwrap();
    assert_eq!(location["username"].to_json(), json!({"old": "jdoe", "new": "mroe"}));
    let contacts = changes["contacts"].as_nested().unwrap();
    assert!(contacts.contains_key("0"));

    assert_eq!(
        device.to_wire_changes_only(),
        json!({
            "location": {"username": "mroe"},
            "contacts": [{"username": "bsmith", "emailAddress": null, "buildingId": null}]
        })
    );

    device.clear_unsaved_changes();
    assert!(!device.has_unsaved_changes());
    assert!(!device.get_object("location").unwrap().unwrap().has_unsaved_changes());
}

#[test]
fn test_set_nested_from_json_validates() {
    let mut device = parsed_device();
    let err = device
        .set("location", json!({"emailAddress": "broken"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    device.set("location", json!({"username": "new"})).unwrap();
    assert_eq!(
        device.get_object("location").unwrap().unwrap().get_str("username").unwrap(),
        Some("new")
    );
    assert!(device.unsaved_changes()["location"].as_change().is_some());
}

#[test]
fn test_set_object_requires_matching_kind() {
    let mut device = parsed_device();
    let other = ModelObject::new(device_schema());
    assert_eq!(
        device.set_object("location", other).unwrap_err().kind(),
        ErrorKind::InvalidData
    );
    let location = ModelObject::new(location_schema());
    device.set_object("location", location).unwrap();
}

#[test]
fn test_to_wire_in_declaration_order_drops_null_list_items() {
    let device = parsed_device();
    let wire = device.to_wire();
    let keys: Vec<&String> = wire.as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        vec!["id", "name", "managed", "platform", "tags", "location", "contacts"]
    );
    assert_eq!(wire["id"], json!("7"));
}

#[test]
fn test_changes_only_skips_readonly() {
    let mut device = parsed_device();
    device.set("managed", false).unwrap();
    assert_eq!(device.to_wire_changes_only(), json!({"managed": false}));
    device.clear_unsaved_changes();
    assert_eq!(device.to_wire_changes_only(), json!({}));
}

#[test]
fn test_create_routes_through_setters() {
    let device = ModelObject::create(device_schema(), &json!({"name": "New", "tags": ["a"]})).unwrap();
    let changes = device.unsaved_changes();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes["name"].to_json(), json!({"old": null, "new": "New"}));

    let err = ModelObject::create(device_schema(), &json!({"id": "1", "name": "x"})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn test_validate_for_save_requires_values() {
    let device = ModelObject::new(device_schema());
    assert_eq!(device.validate_for_save().unwrap_err().kind(), ErrorKind::MissingData);
    assert!(parsed_device().validate_for_save().is_ok());
}

#[test]
fn test_identifier_uniqueness_in_collections() {
    let mut known = KnownIdentifiers::new();
    known.insert("name", "Taken");
    let known = Arc::new(known);

    let mut device = parsed_device().with_known_identifiers(Arc::clone(&known));
    let err = device.set("name", "taken").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    device.set("name", "Free").unwrap();

    let err = ModelObject::create_with_known_identifiers(
        device_schema(),
        &json!({"name": "Taken"}),
        Some(known),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[test]
fn test_own_saved_identifier_is_not_taken() {
    // a collection's known set includes the object's own name
    let mut known = KnownIdentifiers::new();
    known.insert("name", "Lab Mac");
    known.insert("name", "Taken");
    let known = Arc::new(known);

    let mut device = parsed_device().with_known_identifiers(Arc::clone(&known));
    device.set("name", "Bench Mac").unwrap();
    device.set("name", "Lab Mac").unwrap();
    assert_eq!(device.get_str("name").unwrap(), Some("Lab Mac"));
    assert_eq!(device.set("name", "Taken").unwrap_err().kind(), ErrorKind::AlreadyExists);

    let mut device = parsed_device().with_known_identifiers(known);
    device.set("name", "LAB MAC").unwrap();
    assert_eq!(device.get_str("name").unwrap(), Some("LAB MAC"));
}

#[test]
fn test_validate_applies_one_rule_by_priority() {
    let device = parsed_device();
    let location = ModelObject::new(location_schema());

    // custom validator
    let err = location.validate("emailAddress", "not-an-email").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert!(location.validate("emailAddress", "jdoe@example.com").is_ok());

    // enum membership
    let err = device.validate("platform", "Windows").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_eq!(device.validate("platform", "iOS").unwrap(), FieldValue::Json(json!("iOS")));

    // primitive coercion
    assert_eq!(device.validate("managed", "TRUE").unwrap(), FieldValue::Json(json!(true)));
    let err = device.validate("managed", "maybe").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    // identifier format
    assert_eq!(device.validate("id", 12).unwrap(), FieldValue::Json(json!("12")));
    let err = location.validate("buildingId", "HQ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    // nested construction
    let nested = device
        .validate("location", json!({"username": "asmith"}))
        .unwrap();
    assert!(nested.as_object().is_some());
    let err = device
        .validate("location", json!({"emailAddress": "nope"}))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    // passthrough
    let schema = Arc::new(
        ObjectSchema::builder("Blob")
            .attribute(AttributeDefinition::new("payload", FieldType::Any))
            .build()
            .unwrap(),
    );
    let blob = ModelObject::new(schema);
    assert_eq!(
        blob.validate("payload", json!({"any": [1, 2]})).unwrap(),
        FieldValue::Json(json!({"any": [1, 2]}))
    );

    // nothing was assigned
    assert!(!device.has_unsaved_changes());
}

#[test]
fn test_validate_required_lists_and_uniqueness() {
    let mut known = KnownIdentifiers::new();
    known.insert("name", "Taken");
    let device = parsed_device().with_known_identifiers(Arc::new(known));

    assert_eq!(device.validate("name", "").unwrap_err().kind(), ErrorKind::MissingData);
    assert_eq!(device.validate("displayName", "taken").unwrap_err().kind(), ErrorKind::AlreadyExists);
    assert!(device.validate("displayName", "Spare Mac").is_ok());

    let err = device.validate("tags", json!(["a", "b", "c", "d"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_eq!(device.validate("tags", "a").unwrap_err().kind(), ErrorKind::InvalidData);
    assert_eq!(
        device.validate("tags", json!(["a", "b"])).unwrap(),
        FieldValue::List(vec![FieldValue::from("a"), FieldValue::from("b")])
    );
    assert_eq!(device.validate("nope", 1).unwrap_err().kind(), ErrorKind::Unsupported);
}

#[test]
fn test_uniqueness_skipped_for_non_collections() {
    let schema = Arc::new(
        ObjectSchema::builder("Settings")
            .attribute(
                AttributeDefinition::new("name", FieldType::string())
                    .identifier(IdentifierKind::Secondary),
            )
            .build()
            .unwrap(),
    );
    let mut known = KnownIdentifiers::new();
    known.insert("name", "Taken");
    let mut settings = ModelObject::new(schema).with_known_identifiers(Arc::new(known));
    assert!(settings.set("name", "Taken").is_ok());
}

#[test]
fn test_immutable_kind_refuses_setters() {
    let schema = Arc::new(
        ObjectSchema::builder("InventoryReport")
            .immutable()
            .attribute(AttributeDefinition::new("name", FieldType::string()))
            .attribute(AttributeDefinition::new("rows", FieldType::Any).multi())
            .build()
            .unwrap(),
    );
    let mut report = ModelObject::parse(schema, &json!({"name": "r", "rows": [{"a": 1}]})).unwrap();
    assert_eq!(report.set("name", "x").unwrap_err().kind(), ErrorKind::Unsupported);
    assert_eq!(
        report.append("rows", json!({"b": 2})).unwrap_err().kind(),
        ErrorKind::Unsupported
    );
    assert_eq!(report.get_list("rows").unwrap()[0].as_json(), Some(&json!({"a": 1})));
}

#[test]
fn test_extension_attributes_bubble_into_parent() {
    let schema = Arc::new(
        ObjectSchema::builder("Preload")
            .extendable()
            .attribute(AttributeDefinition::new("serialNumber", FieldType::string()))
            .build()
            .unwrap(),
    );
    let mut record = ModelObject::parse(
        schema,
        &json!({
            "serialNumber": "C02X",
            "extensionAttributes": [{"name": "Cost Center", "value": "100"}]
        }),
    )
    .unwrap();
    record.set_extension_attribute("Cost Center", "200").unwrap();

    let changes = record.unsaved_changes();
    let eas = changes["extensionAttributes"].as_nested().unwrap();
    assert_eq!(eas["Cost Center"].to_json(), json!({"old": "100", "new": "200"}));
    assert_eq!(
        record.to_wire_changes_only(),
        json!({"extensionAttributes": [{"name": "Cost Center", "value": "200"}]})
    );

    record.clear_unsaved_changes();
    assert!(!record.has_unsaved_changes());
    assert_eq!(
        record.to_wire()["extensionAttributes"],
        json!([{"name": "Cost Center", "value": "200"}])
    );
}

#[test]
fn test_extension_attributes_unsupported_on_plain_kinds() {
    let mut device = parsed_device();
    let err = device.set_extension_attribute("x", Value::Null).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}
