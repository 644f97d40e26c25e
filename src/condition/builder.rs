//! ConditionBuilder - translates abstract conditions into native query clauses.

use serde_json::{json, Map, Value};

use super::{Condition, ConditionError, NativeQuery};
use crate::document::ID_FIELD;

/// Translates a [`Condition`] into the backend's native query.
///
/// Implementations must be pure: the same condition always yields the same
/// native query, and no I/O happens here.
pub trait ConditionBuilder: Send + Sync {
    fn build(&self, conditions: &Condition) -> Result<NativeQuery, ConditionError>;
}

/// Condition builder for Elasticsearch-style query DSL.
///
/// Filters are emitted in non-scoring (`bool.filter`) context. An empty
/// condition becomes `match_all`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchConditionBuilder;

impl ConditionBuilder for SearchConditionBuilder {
    fn build(&self, conditions: &Condition) -> Result<NativeQuery, ConditionError> {
        let native = translate(conditions.as_value())?
            .map(NativeQuery::new)
            .unwrap_or_else(NativeQuery::match_all);
        log::trace!("built native query {}", native.as_value());
        Ok(native)
    }
}

/// `None` means "no constraint".
fn translate(value: &Value) -> Result<Option<Value>, ConditionError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => translate_hash(map),
        Value::Array(items) => translate_operator(items),
        other => Err(ConditionError::malformed(
            "",
            format!("expected an object or an operator array, got {}", other),
        )),
    }
}

fn translate_hash(map: &Map<String, Value>) -> Result<Option<Value>, ConditionError> {
    let mut clauses = Vec::with_capacity(map.len());
    for (field, value) in map {
        let clause = match value {
            Value::Null => must_not(json!({ "exists": { "field": field } })),
            Value::Array(values) => terms("in", field, values)?,
            scalar => term("=", field, scalar)?,
        };
        clauses.push(clause);
    }
    Ok(conjunction(clauses))
}

fn translate_operator(items: &[Value]) -> Result<Option<Value>, ConditionError> {
    let Some((head, operands)) = items.split_first() else {
        return Ok(None);
    };
    let operator = head
        .as_str()
        .ok_or_else(|| ConditionError::malformed("", "operator must be a string"))?;

    let clause = match operator.trim().to_ascii_lowercase().as_str() {
        "and" => {
            let mut clauses = Vec::with_capacity(operands.len());
            for operand in operands {
                if let Some(clause) = translate(operand)? {
                    clauses.push(clause);
                }
            }
            return Ok(conjunction(clauses));
        }
        "or" => {
            let mut clauses = Vec::with_capacity(operands.len());
            for operand in operands {
                match translate(operand)? {
                    Some(clause) => clauses.push(clause),
                    // one unconstrained branch makes the whole disjunction unconstrained
                    None => return Ok(None),
                }
            }
            return Ok(match clauses.len() {
                0 => None,
                1 => clauses.pop(),
                _ => Some(json!({ "bool": { "should": clauses, "minimum_should_match": 1 } })),
            });
        }
        "not" => {
            let [operand] = operands else {
                return Err(ConditionError::malformed(
                    operator,
                    "expects exactly one sub-condition",
                ));
            };
            let inner = translate(operand)?.unwrap_or_else(|| json!({ "match_all": {} }));
            must_not(inner)
        }
        "=" | "==" => {
            let (field, value) = field_and_value(operator, operands)?;
            term(operator, field, value)?
        }
        "!=" | "<>" => {
            let (field, value) = field_and_value(operator, operands)?;
            must_not(term(operator, field, value)?)
        }
        "in" => {
            let (field, values) = field_and_list(operator, operands)?;
            terms(operator, field, values)?
        }
        "not in" => {
            let (field, values) = field_and_list(operator, operands)?;
            must_not(terms(operator, field, values)?)
        }
        op @ (">" | ">=" | "<" | "<=") => {
            let (field, value) = field_and_value(operator, operands)?;
            let bound = match op {
                ">" => "gt",
                ">=" => "gte",
                "<" => "lt",
                _ => "lte",
            };
            json!({ "range": { field: { bound: scalar(operator, value)? } } })
        }
        "between" => between(operator, operands)?,
        "not between" => must_not(between(operator, operands)?),
        "like" => like(operator, operands)?,
        "not like" => must_not(like(operator, operands)?),
        "exists" => {
            let field = field_operand(operator, operands)?;
            if operands.len() != 1 {
                return Err(ConditionError::malformed(operator, "expects a field name only"));
            }
            json!({ "exists": { "field": field } })
        }
        _ => return Err(ConditionError::UnsupportedOperator(operator.to_string())),
    };
    Ok(Some(clause))
}

fn conjunction(mut clauses: Vec<Value>) -> Option<Value> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(json!({ "bool": { "filter": clauses } })),
    }
}

fn must_not(clause: Value) -> Value {
    json!({ "bool": { "must_not": [clause] } })
}

fn term(operator: &str, field: &str, value: &Value) -> Result<Value, ConditionError> {
    let value = scalar(operator, value)?;
    if field == ID_FIELD {
        return Ok(json!({ "ids": { "values": [id_string(&value)] } }));
    }
    Ok(json!({ "term": { field: value } }))
}

fn terms(operator: &str, field: &str, values: &[Value]) -> Result<Value, ConditionError> {
    let values = values
        .iter()
        .map(|v| scalar(operator, v))
        .collect::<Result<Vec<_>, _>>()?;
    if field == ID_FIELD {
        let ids: Vec<Value> = values.iter().map(|v| id_string(v)).collect();
        return Ok(json!({ "ids": { "values": ids } }));
    }
    Ok(json!({ "terms": { field: values } }))
}

fn between(operator: &str, operands: &[Value]) -> Result<Value, ConditionError> {
    let [field, from, to] = operands else {
        return Err(ConditionError::malformed(
            operator,
            "expects a field and two bounds",
        ));
    };
    let field = field
        .as_str()
        .ok_or_else(|| ConditionError::malformed(operator, "field name must be a string"))?;
    Ok(json!({
        "range": { field: { "gte": scalar(operator, from)?, "lte": scalar(operator, to)? } }
    }))
}

fn like(operator: &str, operands: &[Value]) -> Result<Value, ConditionError> {
    let (field, value) = field_and_value(operator, operands)?;
    let pattern = value
        .as_str()
        .ok_or_else(|| ConditionError::malformed(operator, "pattern must be a string"))?;
    Ok(json!({ "wildcard": { field: { "value": wildcard_pattern(pattern) } } }))
}

/// SQL-style `%`/`_` become `*`/`?`; a bare string matches as a substring.
fn wildcard_pattern(pattern: &str) -> String {
    if pattern.contains('%') || pattern.contains('_') {
        pattern
            .chars()
            .map(|c| match c {
                '%' => '*',
                '_' => '?',
                c => c,
            })
            .collect()
    } else {
        format!("*{}*", pattern)
    }
}

fn field_operand<'a>(operator: &str, operands: &'a [Value]) -> Result<&'a str, ConditionError> {
    operands
        .first()
        .and_then(Value::as_str)
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ConditionError::malformed(operator, "missing field name"))
}

fn field_and_value<'a>(
    operator: &str,
    operands: &'a [Value],
) -> Result<(&'a str, &'a Value), ConditionError> {
    let field = field_operand(operator, operands)?;
    match operands {
        [_, value] => Ok((field, value)),
        _ => Err(ConditionError::malformed(
            operator,
            "expects a field and a single value",
        )),
    }
}

fn field_and_list<'a>(
    operator: &str,
    operands: &'a [Value],
) -> Result<(&'a str, &'a [Value]), ConditionError> {
    let field = field_operand(operator, operands)?;
    match operands {
        [_, Value::Array(values)] => Ok((field, values.as_slice())),
        _ => Err(ConditionError::malformed(
            operator,
            "expects a field and a list of values",
        )),
    }
}

fn scalar<'a>(operator: &str, value: &'a Value) -> Result<&'a Value, ConditionError> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(value),
        other => Err(ConditionError::malformed(
            operator,
            format!("expected a scalar value, got {}", other),
        )),
    }
}

fn id_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        other => Value::String(other.to_string()),
    }
}
