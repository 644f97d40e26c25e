//! Conditions - abstract predicates over document fields, and their translation
//! into the backend's native query DSL.
//!
//! A [`Condition`] is written either in hash format (`{"field": value}`) or in
//! operator format (`["operator", operands...]`), nested freely:
//!
//! ```ignore
//! use search_gateway::{Condition, ConditionBuilder, SearchConditionBuilder};
//!
//! let cond = Condition::and([
//!     Condition::eq("status", "active"),
//!     Condition::or([Condition::gte("age", 18), Condition::is_in("role", ["admin"])]),
//! ]);
//! let native = SearchConditionBuilder.build(&cond)?;
//! ```

mod builder;
mod native;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::document::ID_FIELD;

pub use builder::{ConditionBuilder, SearchConditionBuilder};
pub use native::NativeQuery;

/// Error raised while translating a condition. Always raised before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// The operator or combinator has no backend equivalent.
    #[error("unsupported condition operator: {0}")]
    UnsupportedOperator(String),
    /// The operands do not fit the operator.
    #[error("malformed '{operator}' condition: {reason}")]
    Malformed { operator: String, reason: String },
}

impl ConditionError {
    pub(crate) fn malformed(operator: &str, reason: impl Into<String>) -> Self {
        ConditionError::Malformed {
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }
}

/// Abstract condition tree. `Condition::all()` places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Condition(Value);

impl Condition {
    /// Wrap a raw condition in hash or operator format.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// No constraint: matches every document.
    pub fn all() -> Self {
        Self(Value::Null)
    }

    /// Match by identity.
    pub fn id(id: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(ID_FIELD.to_string(), id.into());
        Self(Value::Object(map))
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::binary("=", field, value.into())
    }

    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Self::binary("!=", field, value.into())
    }

    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Self::binary(">", field, value.into())
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self::binary(">=", field, value.into())
    }

    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Self::binary("<", field, value.into())
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Self::binary("<=", field, value.into())
    }

    pub fn like(field: &str, pattern: &str) -> Self {
        Self::binary("like", field, Value::String(pattern.to_string()))
    }

    pub fn is_in<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::binary("in", field, Value::Array(values))
    }

    pub fn not_in<I, V>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::binary("not in", field, Value::Array(values))
    }

    pub fn between(field: &str, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self(json!(["between", field, from.into(), to.into()]))
    }

    pub fn exists(field: &str) -> Self {
        Self(json!(["exists", field]))
    }

    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::combine("and", conditions)
    }

    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::combine("or", conditions)
    }

    pub fn not(condition: Condition) -> Self {
        Self(json!(["not", condition.0]))
    }

    /// True for the forms that place no constraint: `null`, `{}` and `[]`.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    fn binary(operator: &str, field: &str, value: Value) -> Self {
        Self(json!([operator, field, value]))
    }

    fn combine(operator: &str, conditions: impl IntoIterator<Item = Condition>) -> Self {
        let mut items = vec![Value::String(operator.to_string())];
        items.extend(conditions.into_iter().map(|c| c.0));
        Self(Value::Array(items))
    }
}

impl From<Value> for Condition {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
