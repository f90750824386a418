//! Extension attributes carried by extendable object kinds.
//!
//! The server delivers them as an `extensionAttributes` array of
//! `{definitionId, name, dataType, value}` entries. Each entry validates new
//! values against its declared data type and popup choices, and changes are
//! tracked by name so they bubble into the owning object's unsaved changes.

use super::changes::{Change, UnsavedChange};
use super::value::FieldValue;
use crate::error::{ModelError, ModelResult};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Wire key holding the extension attributes of an object.
pub const EXTENSION_ATTRIBUTES_KEY: &str = "extensionAttributes";

/// Declared data type of an extension attribute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtensionDataType {
    #[default]
    String,
    Integer,
    Date,
}

impl ExtensionDataType {
    fn parse(text: &str) -> ModelResult<Self> {
        match text.to_ascii_uppercase().as_str() {
            "STRING" => Ok(Self::String),
            "INTEGER" | "NUMBER" => Ok(Self::Integer),
            "DATE" => Ok(Self::Date),
            other => Err(ModelError::invalid_data(format!(
                "Unknown extension attribute data type '{}'",
                other
            ))),
        }
    }
}

/// Definition and current value of one extension attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionAttribute {
    pub definition_id: Option<String>,
    pub name: String,
    pub data_type: ExtensionDataType,
    /// Allowed values for popup-menu attributes, empty otherwise
    pub choices: Vec<String>,
    pub value: Value,
}

impl ExtensionAttribute {
    pub fn new(name: impl Into<String>, data_type: ExtensionDataType) -> Self {
        Self {
            definition_id: None,
            name: name.into(),
            data_type,
            choices: Vec::new(),
            value: Value::Null,
        }
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    fn from_wire(raw: &Value) -> ModelResult<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| ModelError::invalid_data("Extension attribute must be an object"))?;
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ModelError::invalid_data("Extension attribute is missing 'name'"))?
            .to_string();
        let definition_id = obj.get("definitionId").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let data_type = match obj.get("dataType").and_then(Value::as_str) {
            Some(t) => ExtensionDataType::parse(t)?,
            None => ExtensionDataType::String,
        };
        let choices = obj
            .get("options")
            .and_then(Value::as_array)
            .map(|opts| {
                opts.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        // computer inventory sends a `values` array, preload records a single `value`
        let value = match obj.get("value") {
            Some(v) => v.clone(),
            None => obj
                .get("values")
                .and_then(Value::as_array)
                .and_then(|vals| vals.first().cloned())
                .unwrap_or(Value::Null),
        };

        Ok(Self {
            definition_id,
            name,
            data_type,
            choices,
            value,
        })
    }

    fn to_wire(&self) -> Value {
        let mut map = Map::new();
        if let Some(id) = &self.definition_id {
            map.insert("definitionId".to_string(), Value::String(id.clone()));
        }
        map.insert("name".to_string(), Value::String(self.name.clone()));
        map.insert("value".to_string(), self.value.clone());
        Value::Object(map)
    }

    /// Check a candidate value against the data type and choices.
    pub fn validate(&self, value: &Value) -> ModelResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let coerced = match self.data_type {
            ExtensionDataType::String => match value {
                Value::String(_) => value.clone(),
                Value::Number(n) => Value::String(n.to_string()),
                _ => {
                    return Err(ModelError::invalid_data(format!(
                        "Extension attribute '{}' requires a string",
                        self.name
                    )));
                }
            },
            ExtensionDataType::Integer => {
                let parsed = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                match parsed {
                    Some(i) => Value::String(i.to_string()),
                    None => {
                        return Err(ModelError::invalid_data(format!(
                            "Extension attribute '{}' requires an integer",
                            self.name
                        )));
                    }
                }
            }
            ExtensionDataType::Date => {
                let text = value.as_str().unwrap_or_default();
                let ok = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").is_ok()
                    || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok();
                if !ok {
                    return Err(ModelError::invalid_data(format!(
                        "Extension attribute '{}' requires a 'yyyy-mm-dd [hh:mm:ss]' date",
                        self.name
                    )));
                }
                value.clone()
            }
        };

        if !self.choices.is_empty() {
            let text = coerced.as_str().unwrap_or_default();
            if !self.choices.iter().any(|c| c == text) {
                return Err(ModelError::invalid_data(format!(
                    "Extension attribute '{}' must be one of {:?}",
                    self.name, self.choices
                )));
            }
        }
        Ok(coerced)
    }
}

/// The extension-attributes sub-collection of one object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionAttributes {
    entries: Vec<ExtensionAttribute>,
    changes: BTreeMap<String, Change>,
}

impl ExtensionAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `extensionAttributes` array; an absent value is empty.
    pub fn from_wire(raw: Option<&Value>) -> ModelResult<Self> {
        let entries = match raw {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(ExtensionAttribute::from_wire)
                .collect::<ModelResult<Vec<_>>>()?,
            Some(_) => {
                return Err(ModelError::invalid_data(format!(
                    "{} must be an array",
                    EXTENSION_ATTRIBUTES_KEY
                )));
            }
        };
        Ok(Self {
            entries,
            changes: BTreeMap::new(),
        })
    }

    /// Make an attribute known locally, e.g. from its definition record.
    ///
    /// A name that is already present keeps its current value.
    pub fn declare(&mut self, attribute: ExtensionAttribute) {
        if !self.entries.iter().any(|e| e.name == attribute.name) {
            self.entries.push(attribute);
        }
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionAttribute> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|e| &e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtensionAttribute> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate and set a value, tracking the change when it differs.
    pub fn set(&mut self, name: &str, value: Value) -> ModelResult<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| ModelError::no_such_item("extension attribute", name))?;
        let new = entry.validate(&value)?;
        if entry.value == new {
            return Ok(());
        }
        let old = std::mem::replace(&mut entry.value, new.clone());
        match self.changes.get_mut(name) {
            Some(change) => change.new = FieldValue::from(new),
            None => {
                self.changes.insert(
                    name.to_string(),
                    Change {
                        old: FieldValue::from(old),
                        new: FieldValue::from(new),
                    },
                );
            }
        }
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn unsaved_changes(&self) -> BTreeMap<String, UnsavedChange> {
        self.changes
            .iter()
            .map(|(k, c)| (k.clone(), UnsavedChange::Value(c.clone())))
            .collect()
    }

    pub fn clear_unsaved_changes(&mut self) {
        self.changes.clear();
    }

    pub fn to_wire(&self) -> Value {
        Value::Array(self.entries.iter().map(ExtensionAttribute::to_wire).collect())
    }

    /// Only the entries with pending changes.
    pub fn to_wire_changes_only(&self) -> Value {
        Value::Array(
            self.entries
                .iter()
                .filter(|e| self.changes.contains_key(&e.name))
                .map(ExtensionAttribute::to_wire)
                .collect(),
        )
    }
}
