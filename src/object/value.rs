//! Attribute values held by a [`ModelObject`].

use super::model::ModelObject;

use serde_json::Value;

/// Current value of one attribute.
///
/// Primitive values are kept as JSON, nested objects keep their own change
/// tracking, and multi-valued attributes hold a list of either.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// No value
    #[default]
    Null,
    /// A primitive or free-form JSON value
    Json(Value),
    /// A nested object
    Object(Box<ModelObject>),
    /// The values of a multi-valued attribute
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Json(Value::Null))
    }

    /// Null, blank text, or an empty list.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Json(v) => crate::schema::validation::is_empty_value(v),
            Self::Object(_) => false,
            Self::List(items) => items.is_empty(),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(Value::as_bool)
    }

    pub fn as_object(&self) -> Option<&ModelObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ModelObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Wire representation; lists drop null entries.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Json(v) => v.clone(),
            Self::Object(o) => o.to_wire(),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .filter(|i| !i.is_null())
                    .map(FieldValue::to_wire)
                    .collect(),
            ),
        }
    }

    /// True when this value, or anything nested in it, has unsaved changes.
    pub(crate) fn has_nested_changes(&self) -> bool {
        match self {
            Self::Object(o) => o.has_unsaved_changes(),
            Self::List(items) => items.iter().any(FieldValue::has_nested_changes),
            _ => false,
        }
    }

    pub(crate) fn clear_nested_changes(&mut self) {
        match self {
            Self::Object(o) => o.clear_unsaved_changes(),
            Self::List(items) => items.iter_mut().for_each(FieldValue::clear_nested_changes),
            _ => {}
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            other => Self::Json(other),
        }
    }
}

impl From<ModelObject> for FieldValue {
    fn from(object: ModelObject) -> Self {
        Self::Object(Box::new(object))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Json(Value::String(value.to_string()))
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        Self::List(items)
    }
}
