//! Shared fixtures for the integration tests.
//!
//! `MockConnection` serves canned responses keyed by `"METHOD path"` (or just
//! the path) and records every request, so tests can assert on what was sent.

#![allow(dead_code)]

use mdm_objects::error::ModelResult;
use mdm_objects::resource::Connection;
use mdm_objects::scope::{MemoryDirectory, NetworkSegment, ScopeKey, ScopeSubject, TargetKind};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: &'static str,
    pub path: String,
    pub body: Option<String>,
}

#[derive(Default)]
pub struct MockConnection {
    responses: HashMap<String, Value>,
    requests: Mutex<Vec<Request>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, key: &str, body: Value) -> Self {
        self.responses.insert(key.to_string(), body);
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, method: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    fn record(&self, method: &'static str, path: &str, body: Option<String>) -> ModelResult<Value> {
        self.requests.lock().unwrap().push(Request {
            method,
            path: path.to_string(),
            body,
        });
        Ok(self
            .responses
            .get(&format!("{} {}", method, path))
            .or_else(|| self.responses.get(path))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

impl Connection for MockConnection {
    fn get(&self, path: &str) -> ModelResult<Value> {
        self.record("GET", path, None)
    }

    fn post(&self, path: &str, body: &Value) -> ModelResult<Value> {
        self.record("POST", path, Some(body.to_string()))
    }

    fn put(&self, path: &str, body: &Value) -> ModelResult<Value> {
        self.record("PUT", path, Some(body.to_string()))
    }

    fn patch(&self, path: &str, body: &Value) -> ModelResult<Value> {
        self.record("PATCH", path, Some(body.to_string()))
    }

    fn delete(&self, path: &str) -> ModelResult<Value> {
        self.record("DELETE", path, None)
    }

    fn post_xml(&self, path: &str, document: &str) -> ModelResult<Value> {
        self.record("POST", path, Some(document.to_string()))
    }

    fn put_xml(&self, path: &str, document: &str) -> ModelResult<Value> {
        self.record("PUT", path, Some(document.to_string()))
    }
}

/// Parse a recorded JSON body.
pub fn json_body(request: &Request) -> Value {
    serde_json::from_str(request.body.as_deref().unwrap_or("null")).unwrap()
}

/// A small organisation: two buildings, two departments, lab and staff
/// groups, office and VPN segments and a directory with two groups.
pub fn directory() -> MemoryDirectory {
    MemoryDirectory::new()
        .with_entity(ScopeKey::Computers, 42, "lab-mac-42")
        .with_entity(ScopeKey::Computers, 43, "lab-mac-43")
        .with_entity(ScopeKey::Computers, 44, "finance-mac-44")
        .with_entity(ScopeKey::ComputerGroups, 7, "Lab Macs")
        .with_entity(ScopeKey::ComputerGroups, 8, "Staff Macs")
        .with_entity(ScopeKey::MobileDevices, 100, "ipad-100")
        .with_entity(ScopeKey::MobileDeviceGroups, 9, "Cart iPads")
        .with_entity(ScopeKey::Buildings, 1, "Headquarters")
        .with_entity(ScopeKey::Buildings, 2, "Annex")
        .with_entity(ScopeKey::Departments, 3, "Finance")
        .with_entity(ScopeKey::Departments, 4, "Engineering")
        .with_entity(ScopeKey::Users, 5, "jsmith")
        .with_entity(ScopeKey::UserGroups, 6, "All Staff")
        .with_segment(NetworkSegment::new(10, "Office", "10.1.0.0", "10.1.255.255").unwrap())
        .with_segment(NetworkSegment::new(11, "VPN", "172.16.0.1", "172.16.0.254").unwrap())
        .with_segment(NetworkSegment::new(12, "Office v6", "fd00:10::", "fd00:10::ffff").unwrap())
        .with_ldap_user("contractor")
        .with_ldap_group("Engineers", ["jsmith", "mkhan"])
        .with_ldap_group("Accountants", ["pdavis"])
        .with_subject(
            TargetKind::Computers,
            lab_mac(42).used_by("jsmith").at_address("10.1.2.3".parse().unwrap()),
        )
        .with_subject(
            TargetKind::Computers,
            ScopeSubject::new(44)
                .in_groups([8])
                .in_building(1)
                .in_department(3)
                .used_by("pdavis"),
        )
}

/// A managed lab computer in the Annex.
pub fn lab_mac(id: u64) -> ScopeSubject {
    ScopeSubject::new(id).in_groups([7]).in_building(2).in_department(4)
}

pub fn building_list() -> Value {
    json!({
        "totalCount": 2,
        "results": [
            {"id": "1", "name": "Headquarters", "streetAddress1": "1 Main St", "city": "Eau Claire"},
            {"id": "2", "name": "Annex", "city": "NY"}
        ]
    })
}

pub fn smart_group_payload() -> Value {
    json!({
        "computer_group": {
            "id": 20,
            "name": "Finance laptops",
            "is_smart": true,
            "site": {"id": -1, "name": "None"},
            "criteria": [
                {"name": "Department", "priority": 0, "and_or": "and", "search_type": "is",
                 "value": "Finance", "opening_paren": false, "closing_paren": false},
                {"name": "Model", "priority": 1, "and_or": "and", "search_type": "like",
                 "value": "MacBook", "opening_paren": false, "closing_paren": false}
            ],
            "computers": [
                {"id": 44, "name": "finance-mac-44", "serial_number": "C02XYZ"}
            ]
        }
    })
}

/// Route `log` output through the test harness; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
