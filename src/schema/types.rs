//! Core schema type definitions for API objects.
//!
//! An [`ObjectSchema`] is the declarative table for one object kind: an
//! ordered list of [`AttributeDefinition`]s plus kind-level flags. The
//! object-model engine derives every accessor, the validation rules and the
//! wire mapping from this table alone.

use super::validation::NamedValidator;
use crate::error::{ModelError, ModelResult};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Primitive value kinds understood by the validation engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    /// UTF-8 string
    String,
    /// Signed integer
    Integer,
    /// Floating point number
    Float,
    /// Boolean, also accepted as "true"/"false" text
    Boolean,
    /// Vendor object identifier: a string of digits, or "-1"
    JamfId,
    /// Device UDID (UUID text)
    Udid,
    /// RFC 3339 timestamp text
    Timestamp,
    /// Base64-encoded binary data
    Binary,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::JamfId => "identifier",
            Self::Udid => "udid",
            Self::Timestamp => "timestamp",
            Self::Binary => "binary",
        };
        f.write_str(name)
    }
}

/// Declared type of an attribute.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A primitive value
    Primitive(PrimitiveKind),
    /// A nested object described by its own schema
    Nested(Arc<ObjectSchema>),
    /// The identifier of another object kind, named by the target
    IdReference(String),
    /// Free-form JSON, stored as given
    Any,
}

impl FieldType {
    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    pub fn integer() -> Self {
        Self::Primitive(PrimitiveKind::Integer)
    }

    pub fn float() -> Self {
        Self::Primitive(PrimitiveKind::Float)
    }

    pub fn boolean() -> Self {
        Self::Primitive(PrimitiveKind::Boolean)
    }

    pub fn jamf_id() -> Self {
        Self::Primitive(PrimitiveKind::JamfId)
    }

    pub fn udid() -> Self {
        Self::Primitive(PrimitiveKind::Udid)
    }

    pub fn timestamp() -> Self {
        Self::Primitive(PrimitiveKind::Timestamp)
    }

    pub fn binary() -> Self {
        Self::Primitive(PrimitiveKind::Binary)
    }

    pub fn nested(schema: Arc<ObjectSchema>) -> Self {
        Self::Nested(schema)
    }

    pub fn id_reference(target: impl Into<String>) -> Self {
        Self::IdReference(target.into())
    }

    /// Whether values of this type are booleans.
    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Primitive(PrimitiveKind::Boolean))
    }

    /// Human-readable type name used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Primitive(kind) => kind.to_string(),
            Self::Nested(schema) => schema.name().to_string(),
            Self::IdReference(target) => format!("{} identifier", target),
            Self::Any => "any".to_string(),
        }
    }
}

/// Whether an attribute addresses an object within its collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierKind {
    /// Not an identifier
    #[default]
    None,
    /// Unique within the collection, but not the primary key
    Secondary,
    /// The primary key of the collection
    Primary,
}

/// Definition of a single attribute.
///
/// Built with chained modifiers:
///
/// ```rust
/// use mdm_objects::schema::{AttributeDefinition, FieldType, IdentifierKind};
///
/// let name = AttributeDefinition::new("name", FieldType::string())
///     .required()
///     .identifier(IdentifierKind::Secondary)
///     .alias("displayName");
/// assert!(name.required);
/// ```
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    /// Attribute name, also the wire key
    pub name: String,
    /// Declared type
    pub field_type: FieldType,
    /// Whether a value must be present
    pub required: bool,
    /// Whether the attribute is managed by the server
    pub readonly: bool,
    /// Whether the attribute holds a list of values
    pub multi: bool,
    /// Identifier role within a collection
    pub identifier: IdentifierKind,
    /// Allowed values, empty when unconstrained
    pub enum_values: Vec<String>,
    /// Custom validator taking precedence over every other check
    pub validator: Option<NamedValidator>,
    /// Alternate names resolving to this attribute
    pub aliases: Vec<String>,
    /// Minimum list length for multi-valued attributes
    pub min_items: Option<usize>,
    /// Maximum list length for multi-valued attributes
    pub max_items: Option<usize>,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            readonly: false,
            multi: false,
            identifier: IdentifierKind::None,
            enum_values: Vec::new(),
            validator: None,
            aliases: Vec::new(),
            min_items: None,
            max_items: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn identifier(mut self, kind: IdentifierKind) -> Self {
        self.identifier = kind;
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn validator(mut self, validator: NamedValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Whether the attribute is the primary or a secondary identifier.
    pub fn is_identifier(&self) -> bool {
        self.identifier != IdentifierKind::None
    }
}

/// Declarative schema for one object kind.
///
/// Attribute order is significant: serialization emits attributes in
/// declaration order.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    name: String,
    attributes: Vec<AttributeDefinition>,
    collection: bool,
    immutable: bool,
    extendable: bool,
    index: HashMap<String, usize>,
}

impl ObjectSchema {
    /// Start declaring a schema for the named object kind.
    pub fn builder(name: impl Into<String>) -> ObjectSchemaBuilder {
        ObjectSchemaBuilder {
            name: name.into(),
            attributes: Vec::new(),
            collection: false,
            immutable: false,
            extendable: false,
        }
    }

    /// Object kind name, e.g. "Building".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attributes in declaration order.
    pub fn attributes(&self) -> &[AttributeDefinition] {
        &self.attributes
    }

    /// Whether instances live in a collection (and identifiers must be unique).
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// Whether instances refuse every setter.
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Whether instances carry an extension-attributes sub-collection.
    pub fn is_extendable(&self) -> bool {
        self.extendable
    }

    /// Look up an attribute by name or alias.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.index.get(name).map(|&i| &self.attributes[i])
    }

    /// Look up an attribute, failing with [`ModelError::UnknownAttribute`].
    pub fn require_attribute(&self, name: &str) -> ModelResult<&AttributeDefinition> {
        self.attribute(name)
            .ok_or_else(|| ModelError::unknown_attribute(name, &self.name))
    }

    /// The primary identifier attribute, if declared.
    pub fn primary_identifier(&self) -> Option<&AttributeDefinition> {
        self.attributes
            .iter()
            .find(|a| a.identifier == IdentifierKind::Primary)
    }

    /// All identifier attributes, primary first.
    pub fn identifiers(&self) -> Vec<&AttributeDefinition> {
        let mut ids: Vec<&AttributeDefinition> =
            self.attributes.iter().filter(|a| a.is_identifier()).collect();
        ids.sort_by_key(|a| a.identifier != IdentifierKind::Primary);
        ids
    }
}

/// Builder for [`ObjectSchema`]; [`build`](Self::build) checks the table.
#[derive(Debug, Clone)]
pub struct ObjectSchemaBuilder {
    name: String,
    attributes: Vec<AttributeDefinition>,
    collection: bool,
    immutable: bool,
    extendable: bool,
}

impl ObjectSchemaBuilder {
    pub fn attribute(mut self, definition: AttributeDefinition) -> Self {
        self.attributes.push(definition);
        self
    }

    pub fn collection(mut self) -> Self {
        self.collection = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    pub fn extendable(mut self) -> Self {
        self.extendable = true;
        self
    }

    /// Validate the declarations and produce the schema.
    ///
    /// Fails with `Unsupported` when more than one attribute is marked as the
    /// primary identifier, or when a name or alias is declared twice.
    pub fn build(self) -> ModelResult<ObjectSchema> {
        let primaries = self
            .attributes
            .iter()
            .filter(|a| a.identifier == IdentifierKind::Primary)
            .count();
        if primaries > 1 {
            return Err(ModelError::unsupported(format!(
                "{} declares {} primary identifiers, at most one is allowed",
                self.name, primaries
            )));
        }

        let mut index = HashMap::new();
        for (i, attr) in self.attributes.iter().enumerate() {
            for key in std::iter::once(&attr.name).chain(attr.aliases.iter()) {
                if index.insert(key.clone(), i).is_some() {
                    return Err(ModelError::unsupported(format!(
                        "{} declares attribute name '{}' more than once",
                        self.name, key
                    )));
                }
            }
        }

        Ok(ObjectSchema {
            name: self.name,
            attributes: self.attributes,
            collection: self.collection,
            immutable: self.immutable,
            extendable: self.extendable,
            index,
        })
    }
}
