//! Connection - the boundary to the search backend.
//!
//! A [`Connection`] executes searches and counts and hands out [`Command`]s for
//! single-document writes and delete-by-query. Transports (HTTP clients, cluster
//! pools, retries) live behind these traits; timeouts and deadlines are theirs
//! to enforce and surface as [`BackendError`]s.

mod options;

use serde_json::Value;
use thiserror::Error;

use crate::condition::NativeQuery;
use crate::document::{Document, DocumentId, Fields};
use crate::query::SearchRequest;

pub use options::WriteOptions;

/// Error reported by the backend boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The targeted identity does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },
    /// The backend did not answer in time.
    #[error("backend timed out: {0}")]
    Timeout(String),
    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The backend rejected the query.
    #[error("malformed query: {0}")]
    MalformedQuery(String),
    #[error("backend error: {0}")]
    Other(String),
}

/// Write and delete operations against one backend.
pub trait Command {
    /// Persist a new document. With an explicit id the backend stores under that
    /// id, replacing any existing document; otherwise it generates one.
    fn insert(
        &self,
        collection: &str,
        document_type: &str,
        fields: &Fields,
        id: Option<&DocumentId>,
        options: &WriteOptions,
    ) -> Result<DocumentId, BackendError>;

    /// Update the document identified by `id`. Fails with
    /// [`BackendError::NotFound`] when it does not exist.
    fn update(
        &self,
        collection: &str,
        document_type: &str,
        id: &DocumentId,
        fields: &Fields,
        options: &WriteOptions,
    ) -> Result<(), BackendError>;

    /// Remove the document identified by `id`.
    fn delete(
        &self,
        collection: &str,
        document_type: &str,
        id: &DocumentId,
        options: &WriteOptions,
    ) -> Result<(), BackendError>;

    /// Remove every document matching `body["query"]` in one backend-side
    /// operation. Returns the backend's raw response, normally `{"total": n, ...}`.
    fn delete_by_query(
        &self,
        collection: &str,
        document_type: &str,
        body: &Value,
    ) -> Result<Value, BackendError>;
}

/// A handle to the search backend.
pub trait Connection: Send + Sync {
    fn create_command(&self) -> Box<dyn Command + '_>;

    /// Execute a search and return the matching documents with `_id` attached.
    fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, BackendError>;

    /// Count the documents matching `query` in `collection`.
    fn count(&self, collection: &str, query: &NativeQuery) -> Result<u64, BackendError>;
}

impl<C: Connection + ?Sized> Connection for &C {
    fn create_command(&self) -> Box<dyn Command + '_> {
        (**self).create_command()
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, BackendError> {
        (**self).search(request)
    }

    fn count(&self, collection: &str, query: &NativeQuery) -> Result<u64, BackendError> {
        (**self).count(collection, query)
    }
}

impl<C: Connection + ?Sized> Connection for std::sync::Arc<C> {
    fn create_command(&self) -> Box<dyn Command + '_> {
        (**self).create_command()
    }

    fn search(&self, request: &SearchRequest) -> Result<Vec<Document>, BackendError> {
        (**self).search(request)
    }

    fn count(&self, collection: &str, query: &NativeQuery) -> Result<u64, BackendError> {
        (**self).count(collection, query)
    }
}
