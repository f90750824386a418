//! Resource wrappers over a mock connection.

mod common;

use common::{MockConnection, json_body};
use mdm_objects::error::ErrorKind;
use mdm_objects::resource::{add_change_log_note, change_log};
use mdm_objects::resources::{Building, Department, MobileDevice};
use mdm_objects::ModelConfig;
use serde_json::json;

fn device_connection() -> MockConnection {
    MockConnection::new()
        .respond(
            "GET v2/mobile-devices",
            json!({
                "totalCount": 1,
                "results": [{
                    "id": "100",
                    "name": "ipad-100",
                    "serialNumber": "DMQX1234",
                    "udid": "c4f1f7a8-9e1b-4a57-8a3e-1d2b3c4d5e6f",
                    "wifiMacAddress": "aa:bb:cc:dd:ee:ff",
                    "type": "ios"
                }]
            }),
        )
        .respond(
            "GET v2/mobile-devices/100/detail",
            json!({
                "id": "100",
                "name": "ipad-100",
                "assetTag": "A-100",
                "managed": true,
                "supervised": true,
                "enforceName": false,
                "location": {"username": "jsmith", "room": "101"},
                "groupIds": ["9"]
            }),
        )
}

#[test]
fn test_mobile_device_details_are_fetched_once() {
    let conn = device_connection();
    let collection = MobileDevice::collection(ModelConfig::default()).unwrap();
    let summary = collection.fetch_all(&conn).unwrap()[0].clone();
    let mut device = MobileDevice::from_summary(summary).unwrap();
    assert_eq!(device.serial_number().unwrap(), Some("DMQX1234"));
    assert!(!device.details_loaded());

    assert_eq!(device.details(&conn).unwrap().get_str("assetTag").unwrap(), Some("A-100"));
    assert!(device.details(&conn).unwrap().is("supervised").unwrap());
    assert!(device.details_loaded());
    let detail_gets: Vec<_> = conn
        .requests_for("GET")
        .into_iter()
        .filter(|r| r.path.ends_with("/detail"))
        .collect();
    assert_eq!(detail_gets.len(), 1);

    device.reload_details();
    device.details(&conn).unwrap();
    assert_eq!(
        conn.requests_for("GET")
            .iter()
            .filter(|r| r.path.ends_with("/detail"))
            .count(),
        2
    );
}

#[test]
fn test_mobile_device_detail_changes() {
    let conn = device_connection();
    let mut device = MobileDevice::parse(&json!({"id": "100", "name": "ipad-100"})).unwrap();

    // nothing loaded, nothing sent
    device.save_details(&conn).unwrap();
    assert!(conn.requests_for("PATCH").is_empty());

    let details = device.details(&conn).unwrap();
    details.set("assetTag", "A-200").unwrap();
    details.set("enforceNameEnabled", true).unwrap();
    details
        .get_object_mut("location")
        .unwrap()
        .unwrap()
        .set("room", "204")
        .unwrap();
    assert_eq!(
        details.set("managed", false).unwrap_err().kind(),
        ErrorKind::Unsupported
    );

    device.save_details(&conn).unwrap();
    let patches = conn.requests_for("PATCH");
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].path, "v2/mobile-devices/100");
    assert_eq!(
        json_body(&patches[0]),
        json!({"assetTag": "A-200", "enforceName": true, "location": {"room": "204"}})
    );
    assert!(!device.details(&conn).unwrap().has_unsaved_changes());
}

#[test]
fn test_mobile_device_requires_summary_kind() {
    let building = Building::create("HQ").unwrap().into_object();
    let err = MobileDevice::from_summary(building).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    let err = MobileDevice::parse(&json!({"name": "no id"})).unwrap().id().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingData);
}

#[test]
fn test_department_lifecycle() {
    let conn = MockConnection::new()
        .respond("GET v1/departments", json!({"totalCount": 1, "results": [{"id": "3", "name": "Finance"}]}))
        .respond("POST v1/departments", json!({"id": "4", "href": "/v1/departments/4"}));
    let collection = Department::collection(ModelConfig::default()).unwrap();

    let err = collection.new_object(&conn, &json!({"name": "FINANCE"})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let mut engineering = collection.new_object(&conn, &json!({"name": "Engineering"})).unwrap();
    assert_eq!(collection.save(&conn, &mut engineering).unwrap(), "4");

    collection.delete(&conn, "4").unwrap();
    assert_eq!(conn.requests_for("DELETE")[0].path, "v1/departments/4");
    // the memo was dropped by the writes
    assert_eq!(conn.requests_for("GET").len(), 1);
    collection.fetch_all(&conn).unwrap();
    assert_eq!(conn.requests_for("GET").len(), 2);
}

#[test]
fn test_building_change_log() {
    let conn = MockConnection::new().respond(
        "GET v1/buildings/1/history",
        json!([
            {"id": "1", "username": "admin", "date": "2024-01-05T09:00:00Z", "note": "Created"},
            {"id": 2, "username": "admin", "date": "2024-02-05T09:00:00Z", "note": "Moved", "details": "city"}
        ]),
    );
    let collection = Building::collection(ModelConfig::default()).unwrap();
    let entries = change_log(&conn, &collection, "1").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].id, "2");
    assert_eq!(entries[1].details.as_deref(), Some("city"));

    add_change_log_note(&conn, &collection, "1", "Audit complete").unwrap();
    assert_eq!(
        json_body(&conn.requests_for("POST")[0]),
        json!({"note": "Audit complete"})
    );
}
