use serde::{Deserialize, Serialize};

fn default_document_type() -> String {
    "_doc".to_string()
}

/// Collection identity of a table gateway.
///
/// ```ignore
/// let config = GatewayConfig::from_json(r#"{"collection_name": "users"}"#)?;
/// assert_eq!(config.document_type, "_doc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub collection_name: String,
    #[serde(default = "default_document_type")]
    pub document_type: String,
}

impl GatewayConfig {
    pub fn new(collection_name: impl Into<String>, document_type: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            document_type: document_type.into(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
