use std::fmt;

use thiserror::Error;

use crate::condition::ConditionError;
use crate::connection::BackendError;
use crate::document::Document;
use crate::query::QueryError;

/// Which write rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    Update,
    Delete,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationKind::Update => f.write_str("update"),
            ValidationKind::Delete => f.write_str("delete"),
        }
    }
}

/// Input rejected before any backend call.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} rejected: {reason}")]
pub struct ValidationError {
    pub kind: ValidationKind,
    /// The offending input.
    pub document: Document,
    pub reason: String,
}

/// Error type for table gateway operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The operation is not supported by this gateway.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    /// The conditions could not be translated into a native query.
    #[error("invalid conditions: {0}")]
    Condition(#[from] ConditionError),
    /// The backend failed while executing the operation.
    #[error("{operation} on {collection} failed: {source}")]
    QueryExecution {
        operation: &'static str,
        collection: String,
        #[source]
        source: QueryError,
    },
    /// An update or delete targeted a missing identity.
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },
}

impl GatewayError {
    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation(_))
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, GatewayError::NotImplemented(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }

    pub(crate) fn execution(
        operation: &'static str,
        collection: &str,
        source: impl Into<QueryError>,
    ) -> Self {
        match source.into() {
            QueryError::Backend(BackendError::NotFound { collection, id }) => {
                GatewayError::NotFound { collection, id }
            }
            source => GatewayError::QueryExecution {
                operation,
                collection: collection.to_string(),
                source,
            },
        }
    }
}
