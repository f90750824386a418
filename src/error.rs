//! Error types for object-model, criteria and scope operations.
//!
//! Every failure in this crate is reported synchronously through [`ModelError`].
//! Callers that only care about the broad category can inspect
//! [`ModelError::kind`], which maps each variant onto an [`ErrorKind`].

/// Broad classification of a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value failed type, enum, format or structural validation
    InvalidData,
    /// A required value is absent, or an operation would leave required data empty
    MissingData,
    /// An identifier could not be resolved to a known entity
    NoSuchItem,
    /// An identifier conflicts with an existing entry
    AlreadyExists,
    /// The operation is structurally forbidden for this kind or instance
    Unsupported,
    /// The caller-supplied connection reported a failure
    Connection,
    /// JSON encoding or decoding failed
    Json,
}

/// Main error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A value failed validation
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Required data is missing
    #[error("Missing data: {message}")]
    MissingData { message: String },

    /// An identifier could not be resolved
    #[error("No {kind} found matching '{identifier}'")]
    NoSuchItem { kind: String, identifier: String },

    /// Identifier conflicts with an existing entry
    #[error("Already exists: {message}")]
    AlreadyExists { message: String },

    /// Structurally forbidden operation
    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    /// Attribute name not declared in the schema
    #[error("Unknown attribute '{attribute}' for {object_kind}")]
    UnknownAttribute {
        attribute: String,
        object_kind: String,
    },

    /// Errors surfaced by the caller's connection
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type used throughout the crate.
pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a missing data error
    pub fn missing_data(message: impl Into<String>) -> Self {
        Self::MissingData {
            message: message.into(),
        }
    }

    /// Create a no-such-item error
    pub fn no_such_item(kind: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NoSuchItem {
            kind: kind.into(),
            identifier: identifier.into(),
        }
    }

    /// Create an already-exists error
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create an unknown attribute error
    pub fn unknown_attribute(attribute: impl Into<String>, object_kind: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            attribute: attribute.into(),
            object_kind: object_kind.into(),
        }
    }

    /// Wrap a transport error raised by a [`Connection`](crate::resource::Connection)
    pub fn connection<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection(Box::new(error))
    }

    /// The broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidData { .. } => ErrorKind::InvalidData,
            Self::MissingData { .. } => ErrorKind::MissingData,
            Self::NoSuchItem { .. } => ErrorKind::NoSuchItem,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Unsupported { .. } | Self::UnknownAttribute { .. } => ErrorKind::Unsupported,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Json(_) => ErrorKind::Json,
        }
    }

    /// True when this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }
}
