//! Pure validation and coercion functions.
//!
//! These functions check a raw JSON value against a declared primitive kind,
//! an enum, or a named custom rule, returning the (possibly coerced) value.
//! They never touch object state; the object-model engine decides which one
//! applies to an attribute.

use super::types::{AttributeDefinition, PrimitiveKind};
use crate::error::{ModelError, ModelResult};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::fmt;
use std::net::IpAddr;

/// A custom validator referenced by name from an attribute definition.
#[derive(Clone, Copy)]
pub struct NamedValidator {
    /// Validator name, used in diagnostics
    pub name: &'static str,
    /// Check function: `(value, attribute name) -> coerced value`
    pub check: fn(&Value, &str) -> ModelResult<Value>,
}

impl fmt::Debug for NamedValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedValidator")
            .field("name", &self.name)
            .finish()
    }
}

impl NamedValidator {
    pub fn validate(&self, value: &Value, attribute: &str) -> ModelResult<Value> {
        (self.check)(value, attribute)
    }
}

/// Rejects empty or whitespace-only strings.
pub const NON_EMPTY_STRING: NamedValidator = NamedValidator {
    name: "non_empty_string",
    check: check_non_empty_string,
};

/// Accepts IPv4 or IPv6 address text.
pub const IP_ADDRESS: NamedValidator = NamedValidator {
    name: "ip_address",
    check: check_ip_address,
};

/// Accepts a plausible e-mail address.
pub const EMAIL_ADDRESS: NamedValidator = NamedValidator {
    name: "email_address",
    check: check_email_address,
};

/// Accepts six hex octets separated by ':' or '-'.
pub const MAC_ADDRESS: NamedValidator = NamedValidator {
    name: "mac_address",
    check: check_mac_address,
};

/// Accepts a `yyyy-mm-dd` date.
pub const DATE_YYYY_MM_DD: NamedValidator = NamedValidator {
    name: "date_yyyy_mm_dd",
    check: check_date,
};

/// Accepts an integer greater than zero.
pub const POSITIVE_INTEGER: NamedValidator = NamedValidator {
    name: "positive_integer",
    check: check_positive_integer,
};

/// Look up one of the built-in validators by name.
pub fn named(name: &str) -> Option<NamedValidator> {
    [
        NON_EMPTY_STRING,
        IP_ADDRESS,
        EMAIL_ADDRESS,
        MAC_ADDRESS,
        DATE_YYYY_MM_DD,
        POSITIVE_INTEGER,
    ]
    .into_iter()
    .find(|v| v.name == name)
}

fn invalid(attribute: &str, expected: &str, value: &Value) -> ModelError {
    ModelError::invalid_data(format!(
        "{} must be {}, got {}",
        attribute,
        expected,
        describe_value(value)
    ))
}

/// Short description of a JSON value for error messages.
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => format!("'{}'", s),
        Value::Array(_) => "an array".to_string(),
        Value::Object(_) => "an object".to_string(),
        other => other.to_string(),
    }
}

/// Whether a value counts as empty for required-attribute checks.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Check and coerce a value to a primitive kind.
pub fn validate_primitive(kind: PrimitiveKind, value: &Value, attribute: &str) -> ModelResult<Value> {
    match kind {
        PrimitiveKind::String => validate_string(value, attribute),
        PrimitiveKind::Integer => validate_integer(value, attribute),
        PrimitiveKind::Float => validate_float(value, attribute),
        PrimitiveKind::Boolean => validate_boolean(value, attribute),
        PrimitiveKind::JamfId => validate_jamf_id(value, attribute),
        PrimitiveKind::Udid => validate_udid(value, attribute),
        PrimitiveKind::Timestamp => validate_timestamp(value, attribute),
        PrimitiveKind::Binary => validate_binary(value, attribute),
    }
}

/// Strings pass; numbers and booleans become their text form.
pub fn validate_string(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(invalid(attribute, "a string", value)),
    }
}

/// Integers pass; integer text is parsed.
pub fn validate_integer(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid(attribute, "an integer", value)),
        _ => Err(invalid(attribute, "an integer", value)),
    }
}

/// Any number passes; numeric text is parsed.
pub fn validate_float(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid(attribute, "a number", value)),
        _ => Err(invalid(attribute, "a number", value)),
    }
}

/// Booleans pass; "true"/"false" text in any case is converted.
pub fn validate_boolean(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid(attribute, "a boolean", value)),
        },
        _ => Err(invalid(attribute, "a boolean", value)),
    }
}

/// Object identifiers are digit strings; "-1" means "none".
///
/// Non-negative integers are coerced to their decimal text.
pub fn validate_jamf_id(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) if i >= -1 => Ok(Value::String(i.to_string())),
            _ => Err(invalid(attribute, "a valid identifier", value)),
        },
        Value::String(s) if s == "-1" => Ok(value.clone()),
        Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(value.clone())
        }
        _ => Err(invalid(attribute, "a valid identifier", value)),
    }
}

pub fn validate_udid(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::String(s) if uuid::Uuid::parse_str(s).is_ok() => Ok(value.clone()),
        _ => Err(invalid(attribute, "a UDID", value)),
    }
}

pub fn validate_timestamp(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::String(s) if DateTime::parse_from_rfc3339(s).is_ok() => Ok(value.clone()),
        _ => Err(invalid(attribute, "an RFC 3339 timestamp", value)),
    }
}

pub fn validate_binary(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::String(s) if STANDARD.decode(s).is_ok() => Ok(value.clone()),
        _ => Err(invalid(attribute, "base64 data", value)),
    }
}

/// The value's text must be one of the allowed values.
pub fn validate_enum(value: &Value, allowed: &[String], attribute: &str) -> ModelResult<Value> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return Err(invalid(attribute, "one of the allowed values", value)),
    };
    if allowed.iter().any(|a| *a == text) {
        Ok(Value::String(text))
    } else {
        Err(ModelError::invalid_data(format!(
            "{} must be one of {:?}, got '{}'",
            attribute, allowed, text
        )))
    }
}

/// Structural list checks for a multi-valued attribute.
pub fn validate_array_size(len: usize, definition: &AttributeDefinition) -> ModelResult<()> {
    if definition.required && len == 0 {
        return Err(ModelError::missing_data(format!(
            "{} requires at least one value",
            definition.name
        )));
    }
    if let Some(max) = definition.max_items {
        if len > max {
            return Err(ModelError::invalid_data(format!(
                "{} may hold at most {} values, got {}",
                definition.name, max, len
            )));
        }
    }
    if let Some(min) = definition.min_items {
        if len < min {
            return Err(ModelError::invalid_data(format!(
                "{} must hold at least {} values, got {}",
                definition.name, min, len
            )));
        }
    }
    Ok(())
}

fn check_non_empty_string(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(value.clone()),
        _ => Err(invalid(attribute, "a non-empty string", value)),
    }
}

fn check_ip_address(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::String(s) if s.parse::<IpAddr>().is_ok() => Ok(value.clone()),
        _ => Err(invalid(attribute, "an IP address", value)),
    }
}

fn check_email_address(value: &Value, attribute: &str) -> ModelResult<Value> {
    let ok = value.as_str().is_some_and(|s| {
        let mut parts = s.splitn(2, '@');
        match (parts.next(), parts.next()) {
            (Some(local), Some(domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            _ => false,
        }
    });
    if ok {
        Ok(value.clone())
    } else {
        Err(invalid(attribute, "an e-mail address", value))
    }
}

fn check_mac_address(value: &Value, attribute: &str) -> ModelResult<Value> {
    let ok = value.as_str().is_some_and(|s| {
        let octets: Vec<&str> = s.split([':', '-']).collect();
        octets.len() == 6
            && octets
                .iter()
                .all(|o| o.len() == 2 && o.bytes().all(|b| b.is_ascii_hexdigit()))
    });
    if ok {
        Ok(value.clone())
    } else {
        Err(invalid(attribute, "a MAC address", value))
    }
}

fn check_date(value: &Value, attribute: &str) -> ModelResult<Value> {
    match value {
        Value::String(s) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => Ok(value.clone()),
        _ => Err(invalid(attribute, "a yyyy-mm-dd date", value)),
    }
}

fn check_positive_integer(value: &Value, attribute: &str) -> ModelResult<Value> {
    let coerced = validate_integer(value, attribute)?;
    match coerced.as_i64() {
        Some(i) if i > 0 => Ok(coerced),
        _ => Err(invalid(attribute, "a positive integer", value)),
    }
}
