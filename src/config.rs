//! Configuration for the object-model and scope engines.
//!
//! Configuration is plain data passed to constructors; nothing in this crate
//! reads process-wide flags. Both structs deserialize from JSON so callers can
//! keep them in a settings file.
//!
//! ```rust
//! use mdm_objects::config::ModelConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ModelConfig::from_json_str(r#"{"scope": {"suppressDataLossWarning": true}}"#)?;
//! assert!(config.scope.suppress_data_loss_warning);
//! assert!(config.enforce_unique_identifiers);
//! # Ok(())
//! # }
//! ```

use crate::error::ModelResult;

use serde::{Deserialize, Serialize};

/// Settings for the scope engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeConfig {
    /// Skip the advisory warning about targets the classic API drops on save
    pub suppress_data_loss_warning: bool,
}

impl ScopeConfig {
    pub fn with_suppressed_data_loss_warning(mut self, suppress: bool) -> Self {
        self.suppress_data_loss_warning = suppress;
        self
    }
}

/// Top-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// Check identifier attributes against the collection before accepting them
    pub enforce_unique_identifiers: bool,
    /// Scope engine settings
    pub scope: ScopeConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enforce_unique_identifiers: true,
            scope: ScopeConfig::default(),
        }
    }
}

impl ModelConfig {
    /// Parse configuration from JSON text; missing keys keep their defaults.
    pub fn from_json_str(text: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_unique_identifiers(mut self, enforce: bool) -> Self {
        self.enforce_unique_identifiers = enforce;
        self
    }

    pub fn with_scope(mut self, scope: ScopeConfig) -> Self {
        self.scope = scope;
        self
    }
}
