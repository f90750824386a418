//! The unsaved-changes ledger.

use super::value::FieldValue;

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Old and new value of one mutated attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub old: FieldValue,
    pub new: FieldValue,
}

/// A pending change, either direct or bubbled up from nested data.
#[derive(Debug, Clone, PartialEq)]
pub enum UnsavedChange {
    /// The attribute itself was reassigned or its list mutated
    Value(Change),
    /// Something inside a nested object, list of objects, or the
    /// extension attributes changed; keyed by attribute name or list index
    Nested(BTreeMap<String, UnsavedChange>),
}

impl UnsavedChange {
    pub fn as_change(&self) -> Option<&Change> {
        match self {
            Self::Value(c) => Some(c),
            Self::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&BTreeMap<String, UnsavedChange>> {
        match self {
            Self::Nested(map) => Some(map),
            Self::Value(_) => None,
        }
    }

    /// JSON rendering, handy for logging and diffs.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(c) => {
                let mut map = Map::new();
                map.insert("old".to_string(), c.old.to_wire());
                map.insert("new".to_string(), c.new.to_wire());
                Value::Object(map)
            }
            Self::Nested(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Per-instance record of direct attribute changes since the last clear.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeLedger {
    entries: BTreeMap<String, Change>,
}

impl ChangeLedger {
    /// Record a change; an existing entry keeps its first `old` value.
    pub fn note(&mut self, attribute: &str, old: FieldValue, new: FieldValue) {
        match self.entries.get_mut(attribute) {
            Some(change) => change.new = new,
            None => {
                self.entries
                    .insert(attribute.to_string(), Change { old, new });
            }
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&Change> {
        self.entries.get(attribute)
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.entries.contains_key(attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Change)> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
