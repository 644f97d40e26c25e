//! Table gateway - uniform CRUD and aggregate access to one backend collection.
//!
//! Every call is an independent request: no documents are cached and no
//! session or cursor state survives between calls, so a gateway can be shared
//! across threads.

mod config;
mod table_gateway;

use crate::condition::Condition;
use crate::connection::WriteOptions;
use crate::document::{Document, DocumentId};
use crate::error::GatewayError;
use crate::query::SortField;

pub use config::GatewayConfig;
pub use table_gateway::SearchTableGateway;

/// CRUD and aggregate contract over a single collection.
///
/// `relations` parameters are accepted for interface compatibility; no
/// relation hydration is performed.
pub trait TableGateway: Send + Sync {
    /// First document matching `conditions`, or `None`.
    fn query_one(
        &self,
        conditions: &Condition,
        relations: &[&str],
    ) -> Result<Option<Document>, GatewayError>;

    /// Documents matching `conditions`. A `limit` of 0 means unbounded, in
    /// which case `offset` is ignored too.
    fn query_all(
        &self,
        conditions: &Condition,
        order: &[SortField],
        limit: usize,
        offset: usize,
        relations: &[&str],
    ) -> Result<Vec<Document>, GatewayError>;

    /// Persist a new document, using its `_id` when present. Returns the identity.
    fn insert(&self, data: Document, options: &WriteOptions) -> Result<DocumentId, GatewayError>;

    /// Update the document identified by `data`'s `_id` with its fields.
    fn update_one(&self, data: Document, options: &WriteOptions) -> Result<(), GatewayError>;

    fn update_all(&self, data: &Document, conditions: &Condition) -> Result<u64, GatewayError>;

    /// Delete the document identified by `data`'s `_id`.
    fn delete_one(&self, data: &Document, options: &WriteOptions) -> Result<(), GatewayError>;

    /// Delete every document matching `conditions`; returns how many the backend removed.
    fn delete_all(&self, conditions: &Condition) -> Result<u64, GatewayError>;

    fn aggregate(
        &self,
        column: &str,
        operator: &str,
        conditions: &Condition,
    ) -> Result<String, GatewayError>;

    /// Number of documents matching `conditions`, as a decimal string.
    fn aggregate_count(&self, field: &str, conditions: &Condition)
        -> Result<String, GatewayError>;

    fn aggregate_sum(&self, field: &str, conditions: &Condition) -> Result<String, GatewayError>;

    fn aggregate_average(&self, field: &str, conditions: &Condition)
        -> Result<String, GatewayError>;

    fn aggregate_min(&self, field: &str, conditions: &Condition) -> Result<String, GatewayError>;

    fn aggregate_max(&self, field: &str, conditions: &Condition) -> Result<String, GatewayError>;
}
