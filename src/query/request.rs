use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::condition::NativeQuery;

/// Specifies the direction for sorting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }
}

/// A fully described search, ready for a [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub collection: String,
    pub query: NativeQuery,
    pub sort: Vec<SortField>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    /// Fields to return; `None` returns every field.
    pub source: Option<Vec<String>>,
}

impl SearchRequest {
    pub fn new(collection: impl Into<String>, query: NativeQuery) -> Self {
        Self {
            collection: collection.into(),
            query,
            sort: Vec::new(),
            limit: None,
            offset: None,
            source: None,
        }
    }

    /// Search body as a transport would send it to `POST /{collection}/_search`.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("query".into(), self.query.as_value().clone());
        if !self.sort.is_empty() {
            let sort: Vec<Value> = self
                .sort
                .iter()
                .map(|s| {
                    let mut clause = Map::new();
                    clause.insert(s.field.clone(), json!({ "order": s.order }));
                    Value::Object(clause)
                })
                .collect();
            body.insert("sort".into(), Value::Array(sort));
        }
        if let Some(limit) = self.limit {
            body.insert("size".into(), json!(limit));
        }
        if let Some(offset) = self.offset {
            body.insert("from".into(), json!(offset));
        }
        if let Some(source) = &self.source {
            body.insert("_source".into(), json!(source));
        }
        Value::Object(body)
    }
}
