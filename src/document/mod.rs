//! Documents - field payloads with an optional identity kept apart from the fields.
//!
//! ## Example
//!
//! ```ignore
//! use search_gateway::Document;
//! use serde_json::json;
//!
//! let doc = Document::from_value(json!({"_id": "x1", "name": "a"}))?;
//! assert_eq!(doc.id().map(|id| id.as_str()), Some("x1"));
//! assert!(doc.fields().get("_id").is_none());
//! ```

mod id;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use id::DocumentId;

/// Field name the backend uses for document identity.
pub const ID_FIELD: &str = "_id";

/// Field map of a document, never containing `_id`.
pub type Fields = Map<String, Value>;

/// A document: an optional identity plus its stored fields.
///
/// Serializes as a flat object with `_id` first when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<DocumentId>,
    #[serde(flatten)]
    fields: Fields,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from a field map, lifting `_id` out of the fields.
    pub fn from_fields(mut fields: Fields) -> Self {
        let id = fields.remove(ID_FIELD).and_then(DocumentId::from_value);
        Self { id, fields }
    }

    /// Build a document from an identity and fields; a stray `_id` field is dropped.
    pub fn from_parts(id: Option<DocumentId>, mut fields: Fields) -> Self {
        fields.remove(ID_FIELD);
        Self { id, fields }
    }

    /// Build a document from a JSON object. Returns `None` for anything but an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self::from_fields(map)),
            _ => None,
        }
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set a field. Setting `_id` sets the identity instead.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if field == ID_FIELD {
            self.id = DocumentId::from_value(value);
        } else {
            self.fields.insert(field, value);
        }
    }

    pub fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    /// The identity, if present and non-empty.
    pub fn key(&self) -> Option<&DocumentId> {
        self.id.as_ref().filter(|id| !id.is_empty())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.fields.is_empty()
    }

    /// Split into identity and fields.
    pub fn into_parts(self) -> (Option<DocumentId>, Fields) {
        (self.id, self.fields)
    }

    /// Flat JSON object with `_id` reattached.
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        if let Some(id) = &self.id {
            map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        }
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

impl From<Fields> for Document {
    fn from(fields: Fields) -> Self {
        Self::from_fields(fields)
    }
}
