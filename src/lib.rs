//! Table gateway over document search backends.
//!
//! Callers describe predicates as abstract [`Condition`]s; a [`ConditionBuilder`]
//! turns them into the backend's native query, a [`Query`] executes reads through
//! a [`Connection`], and [`SearchTableGateway`] ties it together behind the
//! uniform [`TableGateway`] contract.
//!
//! ```ignore
//! use search_gateway::{
//!     Condition, Document, GatewayConfig, InMemoryConnection, SearchTableGateway,
//!     TableGateway, WriteOptions,
//! };
//!
//! let gateway = SearchTableGateway::from_config(
//!     InMemoryConnection::new(),
//!     GatewayConfig::new("users", "_doc"),
//! );
//! let id = gateway.insert(Document::new().with("name", "a"), &WriteOptions::new())?;
//! let found = gateway.query_one(&Condition::id(id.as_str()), &[])?;
//! ```

mod condition;
mod connection;
mod document;
mod error;
mod gateway;
mod memory;
mod query;

pub use condition::{
    Condition, ConditionBuilder, ConditionError, NativeQuery, SearchConditionBuilder,
};
pub use connection::{BackendError, Command, Connection, WriteOptions};
pub use document::{Document, DocumentId, Fields, ID_FIELD};
pub use error::{GatewayError, ValidationError, ValidationKind};
pub use gateway::{GatewayConfig, SearchTableGateway, TableGateway};
pub use memory::InMemoryConnection;
pub use query::{
    DefaultQueryFactory, Query, QueryError, QueryFactory, SearchRequest, SortField, SortOrder,
    COUNT_ALL,
};
