//! SearchTableGateway - table gateway over a search backend connection.

use serde_json::{json, Value};

use super::{GatewayConfig, TableGateway};
use crate::condition::{Condition, ConditionBuilder, SearchConditionBuilder};
use crate::connection::{Connection, WriteOptions};
use crate::document::{Document, DocumentId};
use crate::error::{GatewayError, ValidationError, ValidationKind};
use crate::query::{DefaultQueryFactory, Query, QueryError, QueryFactory, SortField, COUNT_ALL};

const MISSING_ID: &str = "Primary key _id not provided";

/// Table gateway bound to one collection and document type.
///
/// Reads and delete-by-query go through the condition builder and a fresh
/// query; single-document writes go straight to a connection command.
pub struct SearchTableGateway<C, F = DefaultQueryFactory, B = SearchConditionBuilder> {
    connection: C,
    query_factory: F,
    condition_builder: B,
    collection_name: String,
    document_type: String,
}

impl<C: Connection> SearchTableGateway<C> {
    /// Gateway with the default query factory and condition builder.
    pub fn from_config(connection: C, config: GatewayConfig) -> Self {
        Self::new(
            connection,
            DefaultQueryFactory,
            SearchConditionBuilder,
            config.collection_name,
            config.document_type,
        )
    }
}

impl<C, F, B> SearchTableGateway<C, F, B>
where
    C: Connection,
    F: QueryFactory,
    B: ConditionBuilder,
{
    pub fn new(
        connection: C,
        query_factory: F,
        condition_builder: B,
        collection_name: impl Into<String>,
        document_type: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            query_factory,
            condition_builder,
            collection_name: collection_name.into(),
            document_type: document_type.into(),
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    fn query(&self, conditions: &Condition) -> Result<Query<'_>, GatewayError> {
        let filter = self.condition_builder.build(conditions)?;
        Ok(self
            .query_factory
            .create(&self.connection)
            .from(self.collection_name.as_str())
            .filter(filter))
    }

    fn failed<E>(&self, operation: &'static str) -> impl Fn(E) -> GatewayError + '_
    where
        E: Into<QueryError>,
    {
        move |err| GatewayError::execution(operation, &self.collection_name, err)
    }

    fn ignore_relations(&self, relations: &[&str]) {
        if !relations.is_empty() {
            log::debug!(
                "relations {:?} on {} are not resolved",
                relations,
                self.collection_name
            );
        }
    }

    fn not_implemented(&self, operation: &'static str) -> GatewayError {
        log::debug!("{} on {} rejected: not implemented", operation, self.collection_name);
        GatewayError::NotImplemented(operation)
    }
}

impl<C, F, B> TableGateway for SearchTableGateway<C, F, B>
where
    C: Connection,
    F: QueryFactory,
    B: ConditionBuilder,
{
    fn query_one(
        &self,
        conditions: &Condition,
        relations: &[&str],
    ) -> Result<Option<Document>, GatewayError> {
        log::debug!("query_one on {}", self.collection_name);
        self.ignore_relations(relations);
        self.query(conditions)?.one().map_err(self.failed("query_one"))
    }

    fn query_all(
        &self,
        conditions: &Condition,
        order: &[SortField],
        limit: usize,
        offset: usize,
        relations: &[&str],
    ) -> Result<Vec<Document>, GatewayError> {
        log::debug!(
            "query_all on {} (limit {}, offset {})",
            self.collection_name,
            limit,
            offset
        );
        self.ignore_relations(relations);
        let mut query = self.query(conditions)?;
        if limit > 0 {
            query = query.limit(limit).offset(offset);
        }
        if !order.is_empty() {
            query = query.order_by(order.iter().cloned());
        }
        query.all().map_err(self.failed("query_all"))
    }

    fn insert(&self, data: Document, options: &WriteOptions) -> Result<DocumentId, GatewayError> {
        log::debug!("insert into {}", self.collection_name);
        let (id, fields) = data.into_parts();
        self.connection
            .create_command()
            .insert(
                &self.collection_name,
                &self.document_type,
                &fields,
                id.as_ref(),
                options,
            )
            .map_err(self.failed("insert"))
    }

    fn update_one(&self, data: Document, options: &WriteOptions) -> Result<(), GatewayError> {
        let Some(key) = data.key().cloned() else {
            return Err(ValidationError {
                kind: ValidationKind::Update,
                document: data,
                reason: MISSING_ID.to_string(),
            }
            .into());
        };
        log::debug!("update_one {} in {}", key, self.collection_name);
        let (_, fields) = data.into_parts();
        self.connection
            .create_command()
            .update(
                &self.collection_name,
                &self.document_type,
                &key,
                &fields,
                options,
            )
            .map_err(self.failed("update_one"))
    }

    fn update_all(&self, _data: &Document, _conditions: &Condition) -> Result<u64, GatewayError> {
        Err(self.not_implemented("update_all"))
    }

    fn delete_one(&self, data: &Document, options: &WriteOptions) -> Result<(), GatewayError> {
        let Some(key) = data.key() else {
            return Err(ValidationError {
                kind: ValidationKind::Delete,
                document: data.clone(),
                reason: MISSING_ID.to_string(),
            }
            .into());
        };
        log::debug!("delete_one {} in {}", key, self.collection_name);
        self.connection
            .create_command()
            .delete(&self.collection_name, &self.document_type, key, options)
            .map_err(self.failed("delete_one"))
    }

    fn delete_all(&self, conditions: &Condition) -> Result<u64, GatewayError> {
        log::debug!("delete_all on {}", self.collection_name);
        let body = json!({ "query": self.condition_builder.build(conditions)?.into_value() });
        let response = self
            .connection
            .create_command()
            .delete_by_query(&self.collection_name, &self.document_type, &body)
            .map_err(self.failed("delete_all"))?;

        match response.get("total").and_then(Value::as_u64) {
            Some(total) => Ok(total),
            None => {
                log::warn!(
                    "delete_all on {}: response carries no total, reporting 0: {}",
                    self.collection_name,
                    response
                );
                Ok(0)
            }
        }
    }

    fn aggregate(
        &self,
        _column: &str,
        _operator: &str,
        _conditions: &Condition,
    ) -> Result<String, GatewayError> {
        Err(self.not_implemented("aggregate"))
    }

    fn aggregate_count(
        &self,
        field: &str,
        conditions: &Condition,
    ) -> Result<String, GatewayError> {
        log::debug!(
            "aggregate_count({:?}) on {}, counting all matches",
            field,
            self.collection_name
        );
        let count = self
            .query(conditions)?
            .count(COUNT_ALL)
            .map_err(self.failed("aggregate_count"))?;
        Ok(count.to_string())
    }

    fn aggregate_sum(&self, _field: &str, _conditions: &Condition) -> Result<String, GatewayError> {
        Err(self.not_implemented("aggregate_sum"))
    }

    fn aggregate_average(
        &self,
        _field: &str,
        _conditions: &Condition,
    ) -> Result<String, GatewayError> {
        Err(self.not_implemented("aggregate_average"))
    }

    fn aggregate_min(&self, _field: &str, _conditions: &Condition) -> Result<String, GatewayError> {
        Err(self.not_implemented("aggregate_min"))
    }

    fn aggregate_max(&self, _field: &str, _conditions: &Condition) -> Result<String, GatewayError> {
        Err(self.not_implemented("aggregate_max"))
    }
}
