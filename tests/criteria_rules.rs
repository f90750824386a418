//! Smart-group criteria and the computer groups that carry them.

mod common;

use common::{MockConnection, init_logging, smart_group_payload};
use mdm_objects::criteria::{AndOr, Criteria, Criterion, SearchType};
use mdm_objects::error::ErrorKind;
use mdm_objects::resources::ComputerGroup;
use serde_json::json;

fn department_is(value: &str) -> Criterion {
    Criterion::new(AndOr::And, "Department", SearchType::Is, value).unwrap()
}

#[test]
fn test_duplicate_signature_rejected() {
    let mut criteria = Criteria::default();
    criteria.append(department_is("IT")).unwrap();
    let err = criteria.append(department_is("IT")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_eq!(criteria.len(), 1);

    // parentheses are not part of the signature
    let err = criteria
        .prepend(department_is("IT").with_parens(true, false))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    // a different joiner is a different criterion
    criteria
        .append(Criterion::new(AndOr::Or, "Department", SearchType::Is, "IT").unwrap())
        .unwrap();
    assert_eq!(criteria.len(), 2);
}

#[test]
fn test_last_criterion_cannot_be_deleted() {
    let mut criteria = Criteria::new(vec![department_is("IT")]).unwrap();
    let err = criteria.delete_at(0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingData);
    assert_eq!(criteria.len(), 1);
    assert_eq!(criteria.get(0).map(Criterion::value), Some("IT"));
    assert!(!criteria.needs_update());
}

#[test]
fn test_priorities_follow_position() {
    let mut criteria = Criteria::new(vec![department_is("IT"), department_is("HR")]).unwrap();
    criteria.insert_at(1, department_is("Finance")).unwrap();
    criteria.prepend(department_is("Legal")).unwrap();

    let values: Vec<(usize, &str)> = criteria.iter().map(|c| (c.priority(), c.value())).collect();
    assert_eq!(values, [(0, "Legal"), (1, "IT"), (2, "Finance"), (3, "HR")]);

    let removed = criteria.delete_at(1).unwrap();
    assert_eq!(removed.value(), "IT");
    assert_eq!(criteria.get(1).map(Criterion::priority), Some(1));
    assert_eq!(
        criteria.insert_at(9, department_is("Ops")).unwrap_err().kind(),
        ErrorKind::NoSuchItem
    );
}

#[test]
fn test_set_at_may_keep_its_own_signature() {
    let mut criteria = Criteria::new(vec![department_is("IT"), department_is("HR")]).unwrap();
    let old = criteria.set_at(0, department_is("IT").with_parens(true, true)).unwrap();
    assert!(!old.opening_paren());
    assert!(criteria.get(0).is_some_and(Criterion::opening_paren));

    let err = criteria.set_at(0, department_is("HR")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[test]
fn test_search_type_values_are_checked() {
    let err = Criterion::new(AndOr::And, "Last Check-in", SearchType::MoreThanDaysAgo, "soon")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    let err = Criterion::new(AndOr::And, "Warranty Expiration", SearchType::BeforeDate, "01/02/2025")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);

    let mut criterion =
        Criterion::new(AndOr::And, "Last Check-in", SearchType::MoreThanDaysAgo, "30").unwrap();
    assert_eq!(
        criterion.set_search_type(SearchType::AfterDate).unwrap_err().kind(),
        ErrorKind::InvalidData
    );
    assert_eq!(criterion.search_type(), SearchType::MoreThanDaysAgo);
    assert_eq!("more than x days ago".parse::<SearchType>().unwrap(), SearchType::MoreThanDaysAgo);
}

#[test]
fn test_smart_group_from_classic() {
    let group = ComputerGroup::parse(&smart_group_payload()).unwrap();
    assert_eq!(group.id(), Some("20"));
    assert_eq!(group.name().unwrap(), "Finance laptops");
    assert!(group.is_smart().unwrap());
    assert_eq!(group.criteria().len(), 2);
    assert_eq!(group.criteria().get(1).map(Criterion::name), Some("Model"));
    assert!(!group.needs_update());

    let xml = group.to_xml().unwrap();
    assert_eq!(xml.find_path("criteria/size").and_then(|e| e.text()), Some("2"));
    assert_eq!(
        xml.find_path("criteria/criterion/search_type").and_then(|e| e.text()),
        Some("is")
    );
    assert_eq!(xml.find_path("site/id").and_then(|e| e.text()), Some("-1"));
    assert!(xml.find("computers").is_none());
}

#[test]
fn test_smart_group_save_sends_xml_only_when_changed() {
    init_logging();
    let conn = MockConnection::new();
    let mut group = ComputerGroup::parse(&smart_group_payload()).unwrap();

    assert_eq!(group.save(&conn).unwrap(), "20");
    assert!(conn.requests().is_empty());

    group.criteria_mut().unwrap().append(department_is("IT")).unwrap();
    assert!(group.needs_update());
    group.save(&conn).unwrap();
    assert!(!group.needs_update());

    let puts = conn.requests_for("PUT");
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].path, "JSSResource/computergroups/id/20");
    let body = puts[0].body.as_deref().unwrap();
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<size>3</size>"));
    assert!(body.contains("<value>IT</value>"));

    assert_eq!(group.add_member(42).unwrap_err().kind(), ErrorKind::Unsupported);
}

#[test]
fn test_static_group_create() {
    let conn = MockConnection::new().respond("POST JSSResource/computergroups/id/0", json!({"id": 31}));
    let mut group = ComputerGroup::create("Loaners", false).unwrap();
    group.add_member(42).unwrap();
    group.add_member(43).unwrap();
    group.add_member(42).unwrap();
    assert_eq!(group.member_ids().unwrap(), ["42", "43"]);
    assert!(group.remove_member(43).unwrap());
    assert!(!group.remove_member(43).unwrap());
    assert_eq!(group.criteria_mut().unwrap_err().kind(), ErrorKind::Unsupported);

    let id = group.save(&conn).unwrap();
    assert_eq!(id, "31");
    assert_eq!(group.id(), Some("31"));
    assert!(!group.needs_update());

    let posts = conn.requests_for("POST");
    assert_eq!(posts.len(), 1);
    let body = posts[0].body.as_deref().unwrap();
    assert!(body.contains("<name>Loaners</name>"));
    assert!(body.contains("<computers><computer><id>42</id></computer></computers>"));
    assert!(!body.contains("<criteria>"));
}
