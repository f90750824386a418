//! The transport seam.

use crate::error::{ModelError, ModelResult};

use serde_json::Value;

/// Blocking access to the server's REST API.
///
/// Implementations own authentication, base URLs and retries. Paths are
/// relative to the API root, e.g. `v1/buildings/5`. Transport failures should
/// be returned as [`ModelError::Connection`].
pub trait Connection {
    fn get(&self, path: &str) -> ModelResult<Value>;

    fn post(&self, path: &str, body: &Value) -> ModelResult<Value>;

    fn put(&self, path: &str, body: &Value) -> ModelResult<Value>;

    fn patch(&self, path: &str, body: &Value) -> ModelResult<Value>;

    fn delete(&self, path: &str) -> ModelResult<Value>;

    /// POST an XML document to a classic endpoint.
    fn post_xml(&self, path: &str, _document: &str) -> ModelResult<Value> {
        Err(ModelError::unsupported(format!(
            "This connection cannot send XML to {}",
            path
        )))
    }

    /// PUT an XML document to a classic endpoint.
    fn put_xml(&self, path: &str, _document: &str) -> ModelResult<Value> {
        Err(ModelError::unsupported(format!(
            "This connection cannot send XML to {}",
            path
        )))
    }
}

impl<C: Connection + ?Sized> Connection for &C {
    fn get(&self, path: &str) -> ModelResult<Value> {
        (**self).get(path)
    }

    fn post(&self, path: &str, body: &Value) -> ModelResult<Value> {
        (**self).post(path, body)
    }

    fn put(&self, path: &str, body: &Value) -> ModelResult<Value> {
        (**self).put(path, body)
    }

    fn patch(&self, path: &str, body: &Value) -> ModelResult<Value> {
        (**self).patch(path, body)
    }

    fn delete(&self, path: &str) -> ModelResult<Value> {
        (**self).delete(path)
    }

    fn post_xml(&self, path: &str, document: &str) -> ModelResult<Value> {
        (**self).post_xml(path, document)
    }

    fn put_xml(&self, path: &str, document: &str) -> ModelResult<Value> {
        (**self).put_xml(path, document)
    }
}
