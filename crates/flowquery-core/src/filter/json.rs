//! JSON form of a query, as stored in a saved filter.
//!
//! ```json
//! {
//!   "candidateGroup": "accounting",
//!   "dueAfter": 1704067200000,
//!   "processVariables": [{"name": "amount", "operator": "GREATER_THAN", "value": 100}],
//!   "orderingProperties": [{"sortBy": "due", "sortOrder": "asc"}],
//!   "orQueries": [{"name": "Review", "assigned": true}]
//! }
//! ```
//!
//! Scalar filters use the descriptor keys of the entity. Decoding replays
//! every filter through the validating builder, so a stored filter can
//! never bypass the rules a hand-built query obeys. Unknown keys are
//! ignored.

use crate::error::{QueryError, QueryResult};
use crate::operator::non_queryable;
use crate::query::entity::EntityKind;
use crate::query::field::{FieldDescriptor, FieldShape, FieldValue, SuspensionState};
use crate::query::predicate::{OrderTarget, Predicate};
use crate::query::Query;
use chrono::{DateTime, TimeZone, Utc};
use flowquery_proto::{OrderDirection, QueryOperator, ValueKind, VariableScope, VariableValue};
use serde_json::{json, Map, Value};

const OR_QUERIES: &str = "orQueries";
const ORDERING: &str = "orderingProperties";
const NAMES_IGNORE_CASE: &str = "variableNamesIgnoreCase";
const VALUES_IGNORE_CASE: &str = "variableValuesIgnoreCase";
const VARIABLE_SORT: &str = "variable";

const VARIABLE_GROUPS: [(&str, VariableScope); 3] = [
    ("taskVariables", VariableScope::TaskLocal),
    ("processVariables", VariableScope::ProcessInstance),
    ("caseInstanceVariables", VariableScope::CaseInstance),
];

/// Encode a query.
pub fn to_json<E: EntityKind>(query: &Query<E>) -> QueryResult<Value> {
    let mut object = encode_predicate(query.root())?;

    if query.variable_names_ignore_case() {
        object.insert(NAMES_IGNORE_CASE.to_string(), Value::Bool(true));
    }
    if query.variable_values_ignore_case() {
        object.insert(VALUES_IGNORE_CASE.to_string(), Value::Bool(true));
    }

    let ordering: Vec<Value> = query
        .root()
        .ordering()
        .iter()
        .map(|property| match &property.target {
            OrderTarget::Property(key) => json!({
                "sortBy": key,
                "sortOrder": property.direction.as_str(),
            }),
            OrderTarget::Variable { name, scope, kind } => json!({
                "sortBy": VARIABLE_SORT,
                "sortOrder": property.direction.as_str(),
                "parameters": {
                    "variable": name,
                    "scope": scope.as_str(),
                    "type": kind.as_str(),
                },
            }),
        })
        .collect();
    if !ordering.is_empty() {
        object.insert(ORDERING.to_string(), Value::Array(ordering));
    }

    if !query.disjuncts().is_empty() {
        let disjuncts = query
            .disjuncts()
            .iter()
            .map(|d| encode_predicate(d).map(Value::Object))
            .collect::<QueryResult<Vec<_>>>()?;
        object.insert(OR_QUERIES.to_string(), Value::Array(disjuncts));
    }

    Ok(Value::Object(object))
}

fn encode_predicate<E: EntityKind>(predicate: &Predicate<E>) -> QueryResult<Map<String, Value>> {
    let mut object = Map::new();
    for descriptor in E::descriptors() {
        if let Some(value) = predicate.get(descriptor.field) {
            object.insert(descriptor.key.to_string(), encode_value(value));
        }
    }

    for (key, scope) in VARIABLE_GROUPS {
        let mut conditions = Vec::new();
        for condition in predicate.variables().iter().filter(|c| c.scope == scope) {
            let value = condition
                .value
                .to_json()
                .ok_or_else(|| non_queryable(condition.value.kind()))?;
            conditions.push(json!({
                "name": condition.name,
                "operator": condition.operator.as_str(),
                "value": value,
            }));
        }
        if !conditions.is_empty() {
            object.insert(key.to_string(), Value::Array(conditions));
        }
    }
    Ok(object)
}

fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => Value::String(text.clone()),
        FieldValue::Integer(n) => Value::from(*n),
        FieldValue::Timestamp(ts) => Value::from(ts.timestamp_millis()),
        FieldValue::TextList(items) => Value::from(items.clone()),
        FieldValue::Flag => Value::Bool(true),
        FieldValue::Suspension(SuspensionState::Active) => Value::from("active"),
        FieldValue::Suspension(SuspensionState::Suspended) => Value::from("suspended"),
    }
}

/// Decode a query, validating every filter as it is applied.
pub fn from_json<E: EntityKind>(value: &Value) -> QueryResult<Query<E>> {
    let object = value
        .as_object()
        .ok_or_else(|| QueryError::Json("query must be a JSON object".to_string()))?;

    let mut query = Query::new();
    apply_predicate(&mut query, object)?;

    if let Some(ordering) = object.get(ORDERING) {
        let ordering = ordering
            .as_array()
            .ok_or_else(|| QueryError::Json(format!("{} must be an array", ORDERING)))?;
        for property in ordering {
            apply_ordering(&mut query, property)?;
        }
    }

    if let Some(disjuncts) = object.get(OR_QUERIES) {
        let disjuncts = disjuncts
            .as_array()
            .ok_or_else(|| QueryError::Json(format!("{} must be an array", OR_QUERIES)))?;
        for disjunct in disjuncts {
            let disjunct = disjunct
                .as_object()
                .ok_or_else(|| QueryError::Json("or query must be a JSON object".to_string()))?;
            query.or()?;
            apply_predicate(&mut query, disjunct)?;
            query.end_or()?;
        }
    }

    if flag(object, NAMES_IGNORE_CASE) {
        query.match_variable_names_ignore_case();
    }
    if flag(object, VALUES_IGNORE_CASE) {
        query.match_variable_values_ignore_case();
    }
    Ok(query)
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn apply_predicate<E: EntityKind>(query: &mut Query<E>, object: &Map<String, Value>) -> QueryResult<()> {
    for descriptor in E::descriptors() {
        let Some(raw) = object.get(descriptor.key) else {
            continue;
        };
        if raw.is_null() {
            continue;
        }
        if let Some(value) = decode_value(descriptor, raw)? {
            query.set(descriptor.field, value)?;
        }
    }

    for (key, scope) in VARIABLE_GROUPS {
        let Some(conditions) = object.get(key) else {
            continue;
        };
        let conditions = conditions
            .as_array()
            .ok_or_else(|| QueryError::Json(format!("{} must be an array", key)))?;
        for condition in conditions {
            let name = condition
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| QueryError::Json(format!("{} entry is missing a name", key)))?;
            let operator = condition
                .get("operator")
                .and_then(Value::as_str)
                .unwrap_or(QueryOperator::Equals.as_str())
                .parse::<QueryOperator>()?;
            let value = VariableValue::from_json(condition.get("value").unwrap_or(&Value::Null));
            query.add_variable(name, scope, operator, value)?;
        }
    }
    Ok(())
}

/// `Ok(None)` for flags stored as `false`.
fn decode_value<F: 'static>(descriptor: &FieldDescriptor<F>, raw: &Value) -> QueryResult<Option<FieldValue>> {
    let mismatch = || {
        QueryError::Json(format!(
            "{} has the wrong type, expected {}",
            descriptor.key,
            descriptor.shape.as_str()
        ))
    };
    let value = match descriptor.shape {
        FieldShape::Text => FieldValue::Text(raw.as_str().ok_or_else(mismatch)?.to_string()),
        FieldShape::Integer => FieldValue::Integer(raw.as_i64().ok_or_else(mismatch)?),
        FieldShape::Timestamp => FieldValue::Timestamp(decode_timestamp(raw).ok_or_else(mismatch)?),
        FieldShape::TextList => {
            let items = raw.as_array().ok_or_else(mismatch)?;
            let items = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(mismatch)?;
            FieldValue::TextList(items)
        }
        FieldShape::Flag => match raw.as_bool().ok_or_else(mismatch)? {
            true => FieldValue::Flag,
            false => return Ok(None),
        },
        FieldShape::Suspension => match raw.as_str() {
            Some("active") => FieldValue::Suspension(SuspensionState::Active),
            Some("suspended") => FieldValue::Suspension(SuspensionState::Suspended),
            _ => return Err(mismatch()),
        },
    };
    Ok(Some(value))
}

/// Epoch milliseconds or an RFC 3339 string.
fn decode_timestamp(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Number(n) => Utc.timestamp_millis_opt(n.as_i64()?).single(),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        _ => None,
    }
}

fn apply_ordering<E: EntityKind>(query: &mut Query<E>, property: &Value) -> QueryResult<()> {
    let sort_by = property
        .get("sortBy")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::Json("ordering property is missing sortBy".to_string()))?;
    let direction = match property.get("sortOrder").and_then(Value::as_str) {
        Some(order) => order.parse::<OrderDirection>()?,
        None => OrderDirection::default(),
    };

    if sort_by != VARIABLE_SORT {
        query.order_by(sort_by, direction)?;
        return Ok(());
    }

    let parameters = property
        .get("parameters")
        .ok_or_else(|| QueryError::Json("variable ordering is missing parameters".to_string()))?;
    let name = parameters
        .get("variable")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::Json("variable ordering is missing the variable name".to_string()))?;
    let scope = parameters
        .get("scope")
        .and_then(Value::as_str)
        .unwrap_or(VariableScope::ProcessInstance.as_str())
        .parse::<VariableScope>()?;
    let kind = parameters
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| QueryError::Json("variable ordering is missing the value type".to_string()))?
        .parse::<ValueKind>()?;
    query.order_by_variable(name, scope, kind, direction)?;
    Ok(())
}
