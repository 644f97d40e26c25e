//! Evaluation of native query clauses and sort keys against stored fields.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::connection::BackendError;
use crate::document::{Fields, ID_FIELD};
use crate::query::{SortField, SortOrder};

pub(crate) fn matches(query: &Value, id: &str, fields: &Fields) -> Result<bool, BackendError> {
    let (kind, body) = single_clause(query)?;
    match kind {
        "match_all" => Ok(true),
        "ids" => {
            let values = body
                .get("values")
                .and_then(Value::as_array)
                .ok_or_else(|| malformed("ids requires a values array"))?;
            Ok(values.iter().any(|v| v.as_str() == Some(id)))
        }
        "term" => {
            let (field, expected) = field_clause(kind, body)?;
            let expected = expected.get("value").unwrap_or(expected);
            Ok(any_value(lookup(fields, field), |v| equal(v, expected)))
        }
        "terms" => {
            let (field, expected) = field_clause(kind, body)?;
            let expected = expected
                .as_array()
                .ok_or_else(|| malformed("terms requires an array of values"))?;
            Ok(any_value(lookup(fields, field), |v| {
                expected.iter().any(|e| equal(v, e))
            }))
        }
        "range" => {
            let (field, bounds) = field_clause(kind, body)?;
            let bounds = bounds
                .as_object()
                .ok_or_else(|| malformed("range requires an object of bounds"))?;
            Ok(any_value(lookup(fields, field), |v| within(v, bounds)))
        }
        "wildcard" => {
            let (field, pattern) = field_clause(kind, body)?;
            let pattern = pattern
                .get("value")
                .unwrap_or(pattern)
                .as_str()
                .ok_or_else(|| malformed("wildcard requires a string pattern"))?;
            Ok(any_value(lookup(fields, field), |v| {
                v.as_str().map(|s| glob(pattern, s)).unwrap_or(false)
            }))
        }
        "exists" => {
            let field = body
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| malformed("exists requires a field"))?;
            if field == ID_FIELD {
                // every stored document has an identity
                return Ok(true);
            }
            Ok(matches!(lookup(fields, field), Some(v) if !v.is_null()))
        }
        "bool" => matches_bool(body, id, fields),
        other => Err(malformed(&format!("unsupported clause {}", other))),
    }
}

fn matches_bool(body: &Value, id: &str, fields: &Fields) -> Result<bool, BackendError> {
    let body = body
        .as_object()
        .ok_or_else(|| malformed("bool requires an object"))?;

    let mut required = 0;
    for occur in ["filter", "must"] {
        for clause in clauses(body, occur) {
            required += 1;
            if !matches(clause, id, fields)? {
                return Ok(false);
            }
        }
    }
    for clause in clauses(body, "must_not") {
        if matches(clause, id, fields)? {
            return Ok(false);
        }
    }

    let should = clauses(body, "should");
    if should.is_empty() {
        return Ok(true);
    }
    let minimum = body
        .get("minimum_should_match")
        .and_then(Value::as_u64)
        .unwrap_or(if required == 0 { 1 } else { 0 });
    let mut hits = 0;
    for clause in should {
        if matches(clause, id, fields)? {
            hits += 1;
        }
    }
    Ok(hits >= minimum)
}

fn clauses<'a>(body: &'a Map<String, Value>, occur: &str) -> Vec<&'a Value> {
    match body.get(occur) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(clause) => vec![clause],
        None => Vec::new(),
    }
}

fn single_clause(query: &Value) -> Result<(&str, &Value), BackendError> {
    match query.as_object() {
        Some(map) if map.len() == 1 => map
            .iter()
            .next()
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| malformed("empty clause")),
        _ => Err(malformed(&format!("expected a single-key clause, got {}", query))),
    }
}

fn field_clause<'a>(kind: &str, body: &'a Value) -> Result<(&'a str, &'a Value), BackendError> {
    match body.as_object() {
        Some(map) if map.len() == 1 => map
            .iter()
            .next()
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| malformed(kind)),
        _ => Err(malformed(&format!("{} requires exactly one field", kind))),
    }
}

/// Field value by name, falling back to a dotted path into nested objects.
pub(crate) fn lookup<'a>(fields: &'a Fields, field: &str) -> Option<&'a Value> {
    if let Some(value) = fields.get(field) {
        return Some(value);
    }
    let mut parts = field.split('.');
    let mut current = fields.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Multi-valued fields match when any element does.
fn any_value(value: Option<&Value>, pred: impl Fn(&Value) -> bool) -> bool {
    match value {
        Some(Value::Array(items)) => items.iter().any(&pred),
        Some(v) => pred(v),
        None => false,
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

fn within(value: &Value, bounds: &Map<String, Value>) -> bool {
    bounds.iter().all(|(bound, limit)| {
        let Some(ord) = compare(value, limit) else {
            return false;
        };
        match bound.as_str() {
            "gt" => ord == Ordering::Greater,
            "gte" => ord != Ordering::Less,
            "lt" => ord == Ordering::Less,
            "lte" => ord != Ordering::Greater,
            _ => true,
        }
    })
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Integers compare exactly; `f64` is only used once a float is involved.
fn compare_numbers(x: &Number, y: &Number) -> Option<Ordering> {
    match (x.as_i64(), y.as_i64(), x.as_u64(), y.as_u64()) {
        (Some(a), Some(b), _, _) => Some(a.cmp(&b)),
        (_, _, Some(a), Some(b)) => Some(a.cmp(&b)),
        // a negative integer against one above i64::MAX
        (Some(_), None, None, Some(_)) => Some(Ordering::Less),
        (None, Some(_), Some(_), None) => Some(Ordering::Greater),
        _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
    }
}

/// Orders two documents by `sort`; missing values sort last in either direction.
pub(crate) fn compare_by(sort: &[SortField], a: &Fields, b: &Fields) -> Ordering {
    for key in sort {
        let ord = match (lookup(a, &key.field), lookup(b, &key.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = compare(x, y).unwrap_or(Ordering::Equal);
                match key.order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            }
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// `*` matches any run of characters, `?` exactly one.
fn glob(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

fn malformed(reason: &str) -> BackendError {
    BackendError::MalformedQuery(reason.to_string())
}
