use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Backend-native query clause (Elasticsearch query DSL).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeQuery(Value);

impl NativeQuery {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The clause matching every document.
    pub fn match_all() -> Self {
        Self(json!({ "match_all": {} }))
    }

    pub fn is_match_all(&self) -> bool {
        self.0
            .as_object()
            .map(|m| m.len() == 1 && m.contains_key("match_all"))
            .unwrap_or(false)
    }

    /// Conjunction of this clause and `other`, dropping `match_all` operands.
    pub fn and(self, other: NativeQuery) -> Self {
        match (self.is_match_all(), other.is_match_all()) {
            (true, _) => other,
            (_, true) => self,
            _ => Self(json!({ "bool": { "filter": [self.0, other.0] } })),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for NativeQuery {
    fn default() -> Self {
        Self::match_all()
    }
}
