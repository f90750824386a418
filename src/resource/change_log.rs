//! Object history notes.
//!
//! Collections that keep history expose it under `{collection}/{id}/history`.

use super::collection::Collection;
use super::connection::Connection;
use crate::error::{ModelError, ModelResult};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub username: String,
    pub date: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// History entries of one object, oldest first as the server returns them.
pub fn change_log<C: Connection + ?Sized>(
    conn: &C,
    collection: &Collection,
    id: &str,
) -> ModelResult<Vec<ChangeLogEntry>> {
    let response = conn.get(&history_path(collection, id))?;
    let results = match response {
        Value::Object(mut map) => map.remove("results").unwrap_or(Value::Array(Vec::new())),
        Value::Array(items) => Value::Array(items),
        other => {
            return Err(ModelError::invalid_data(format!(
                "History response is not a list: {}",
                other
            )));
        }
    };
    Ok(serde_json::from_value(results)?)
}

/// Add a free-text note to an object's history.
pub fn add_change_log_note<C: Connection + ?Sized>(
    conn: &C,
    collection: &Collection,
    id: &str,
    note: &str,
) -> ModelResult<()> {
    if note.trim().is_empty() {
        return Err(ModelError::missing_data("A change log note cannot be empty"));
    }
    conn.post(&history_path(collection, id), &json!({ "note": note }))?;
    debug!("Added change log note to {}", collection.member_path(id));
    Ok(())
}

fn history_path(collection: &Collection, id: &str) -> String {
    format!("{}/history", collection.member_path(id))
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}
