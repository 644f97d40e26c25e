//! Query - a fluent, single-use search description bound to a connection.
//!
//! ## Example
//!
//! ```ignore
//! use search_gateway::{DefaultQueryFactory, QueryFactory, SortField};
//!
//! let docs = DefaultQueryFactory
//!     .create(&connection)
//!     .from("users")
//!     .filter(native)
//!     .order_by(vec![SortField::desc("age")])
//!     .limit(5)
//!     .offset(10)
//!     .all()?;
//! ```

mod factory;
mod request;

use thiserror::Error;

use crate::condition::NativeQuery;
use crate::connection::{BackendError, Connection};
use crate::document::Document;

pub use factory::{DefaultQueryFactory, QueryFactory};
pub use request::{SearchRequest, SortField, SortOrder};

/// Field name meaning "count every match".
pub const COUNT_ALL: &str = "*";

/// Error raised by a query's terminal operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// `from(...)` was never called.
    #[error("query has no source collection")]
    MissingSource,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Builder state for one search. Consumed by `one`, `all` or `count`.
pub struct Query<'c> {
    connection: &'c dyn Connection,
    source: Option<String>,
    filter: Option<NativeQuery>,
    sort: Vec<SortField>,
    limit: Option<usize>,
    offset: Option<usize>,
    fields: Option<Vec<String>>,
}

impl<'c> Query<'c> {
    pub fn new(connection: &'c dyn Connection) -> Self {
        Self {
            connection,
            source: None,
            filter: None,
            sort: Vec::new(),
            limit: None,
            offset: None,
            fields: None,
        }
    }

    pub fn from(mut self, collection: impl Into<String>) -> Self {
        self.source = Some(collection.into());
        self
    }

    /// Attach a native filter. Without one the query matches every document.
    pub fn filter(mut self, filter: NativeQuery) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, sort: impl IntoIterator<Item = SortField>) -> Self {
        self.sort = sort.into_iter().collect();
        self
    }

    /// Page size. `0` means unbounded and clears any earlier limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Restrict the returned fields. `_id` is always returned.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Render the request without executing it.
    pub fn to_request(&self) -> Result<SearchRequest, QueryError> {
        let collection = self.source.clone().ok_or(QueryError::MissingSource)?;
        Ok(SearchRequest {
            collection,
            query: self.filter.clone().unwrap_or_default(),
            sort: self.sort.clone(),
            limit: self.limit,
            offset: self.offset,
            source: self.fields.clone(),
        })
    }

    /// First match, or `None` when nothing matches.
    pub fn one(self) -> Result<Option<Document>, QueryError> {
        let mut request = self.to_request()?;
        request.limit = Some(1);
        let documents = self.connection.search(&request)?;
        Ok(documents.into_iter().next().filter(|doc| !doc.is_empty()))
    }

    /// Every match within the pagination window; empty when nothing matches.
    pub fn all(self) -> Result<Vec<Document>, QueryError> {
        let request = self.to_request()?;
        Ok(self.connection.search(&request)?)
    }

    /// Number of matches, ignoring sort and pagination. A `field` other than
    /// `*` (or empty) only counts documents carrying that field.
    pub fn count(self, field: &str) -> Result<u64, QueryError> {
        let collection = self.source.ok_or(QueryError::MissingSource)?;
        let mut query = self.filter.unwrap_or_default();
        if !field.is_empty() && field != COUNT_ALL {
            query = query.and(NativeQuery::new(
                serde_json::json!({ "exists": { "field": field } }),
            ));
        }
        Ok(self.connection.count(&collection, &query)?)
    }
}
