//! In-memory execution of prepared queries.
//!
//! A reference [`ExecutionSink`] that evaluates the descriptor tests,
//! variable conditions and candidate groups of a [`PreparedQuery`]
//! directly against a list of records. Used by the CLI and by tests.

use crate::error::{BoxError, QueryError, QueryResult};
use crate::query::entity::EntityKind;
use crate::query::field::{FieldDescriptor, FieldTest, FieldValue, SuspensionState};
use crate::query::predicate::{OrderTarget, Predicate};
use crate::query::prepare::PreparedQuery;
use crate::query::sink::{ExecutionSink, Page};
use crate::variable::VariableCondition;
use flowquery_proto::{OrderDirection, QueryOperator, ValueKind, VariableScope, VariableValue};
use serde_json::json;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// A variable stored on a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordVariable {
    pub name: String,
    pub scope: VariableScope,
    pub value: VariableValue,
}

/// One stored entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub id: String,
    pub columns: BTreeMap<String, VariableValue>,
    pub variables: Vec<RecordVariable>,
    pub candidate_users: Vec<String>,
    pub candidate_groups: Vec<String>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        scope: VariableScope,
        value: impl Into<VariableValue>,
    ) -> Self {
        self.variables.push(RecordVariable {
            name: name.into(),
            scope,
            value: value.into(),
        });
        self
    }

    pub fn with_candidate_user(mut self, user: impl Into<String>) -> Self {
        self.candidate_users.push(user.into());
        self
    }

    pub fn with_candidate_group(mut self, group: impl Into<String>) -> Self {
        self.candidate_groups.push(group.into());
        self
    }

    /// Non-null column value.
    pub fn column(&self, name: &str) -> Option<&VariableValue> {
        self.columns.get(name).filter(|v| !v.is_null())
    }

    /// Like [`Record::column`], but `id` resolves to the record id.
    fn column_or_id(&self, name: &str) -> Option<VariableValue> {
        if name == "id" {
            return Some(VariableValue::String(self.id.clone()));
        }
        self.column(name).cloned()
    }

    /// Decode a record from its JSON form.
    ///
    /// ```json
    /// {"id": "t1", "columns": {"name": "Review", "priority": 50},
    ///  "variables": [{"name": "amount", "scope": "processInstance", "value": 900}],
    ///  "candidateUsers": ["kermit"], "candidateGroups": ["sales"]}
    /// ```
    pub fn from_json(value: &serde_json::Value) -> QueryResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| QueryError::Json("record must be an object".to_string()))?;
        let id = object
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| QueryError::Json("record is missing a string id".to_string()))?;
        let mut record = Record::new(id);

        if let Some(columns) = object.get("columns").and_then(|v| v.as_object()) {
            for (name, value) in columns {
                record.columns.insert(name.clone(), VariableValue::from_json(value));
            }
        }
        if let Some(variables) = object.get("variables").and_then(|v| v.as_array()) {
            for variable in variables {
                let name = variable
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| QueryError::Json(format!("variable of record {} has no name", id)))?;
                let scope = variable
                    .get("scope")
                    .and_then(|v| v.as_str())
                    .unwrap_or("processInstance")
                    .parse::<VariableScope>()?;
                let value = variable.get("value").unwrap_or(&serde_json::Value::Null);
                record = record.with_variable(name, scope, VariableValue::from_json(value));
            }
        }
        record.candidate_users = string_list(object.get("candidateUsers"));
        record.candidate_groups = string_list(object.get("candidateGroups"));
        Ok(record)
    }

    /// JSON form accepted by [`Record::from_json`].
    pub fn to_json(&self) -> serde_json::Value {
        let columns: serde_json::Map<String, serde_json::Value> = self
            .columns
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json().unwrap_or(serde_json::Value::Null)))
            .collect();
        let variables: Vec<serde_json::Value> = self
            .variables
            .iter()
            .map(|v| {
                json!({
                    "name": v.name,
                    "scope": v.scope.as_str(),
                    "value": v.value.to_json().unwrap_or(serde_json::Value::Null),
                })
            })
            .collect();
        json!({
            "id": self.id,
            "columns": columns,
            "variables": variables,
            "candidateUsers": self.candidate_users,
            "candidateGroups": self.candidate_groups,
        })
    }
}

fn string_list(value: Option<&serde_json::Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    Any,
    One,
    Literal(char),
}

fn like_tokens(pattern: &str) -> Vec<LikeToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::Any,
            '_' => LikeToken::One,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            other => LikeToken::Literal(other),
        });
    }
    tokens
}

/// SQL LIKE matching with `%`, `_` and `\` escapes.
///
/// Greedy two-pointer scan: on a mismatch, backtrack to the last `%` and
/// let it absorb one more character.
pub fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let tokens = like_tokens(pattern);
    let (mut v, mut p) = (0, 0);
    let mut last_any: Option<(usize, usize)> = None;

    while v < value.len() {
        match tokens.get(p) {
            Some(LikeToken::Any) => {
                last_any = Some((p, v));
                p += 1;
                continue;
            }
            Some(LikeToken::One) => {
                v += 1;
                p += 1;
                continue;
            }
            Some(LikeToken::Literal(c)) if *c == value[v] => {
                v += 1;
                p += 1;
                continue;
            }
            _ => {}
        }
        match last_any {
            Some((any_p, any_v)) => {
                last_any = Some((any_p, any_v + 1));
                p = any_p + 1;
                v = any_v + 1;
            }
            None => return false,
        }
    }
    tokens[p..].iter().all(|t| *t == LikeToken::Any)
}

/// Order a stored column relative to a filter value.
fn compare_column(column: Option<&VariableValue>, value: &FieldValue) -> Option<Ordering> {
    let column = column?;
    match value {
        FieldValue::Text(expected) => column.as_str().map(|s| s.cmp(expected.as_str())),
        FieldValue::Integer(expected) => match column {
            VariableValue::Double(d) => d.partial_cmp(&(*expected as f64)),
            other => other.as_i64().map(|v| v.cmp(expected)),
        },
        FieldValue::Timestamp(expected) => column.as_i64().map(|ms| ms.cmp(&expected.timestamp_millis())),
        _ => None,
    }
}

fn field_matches(test: FieldTest, value: &FieldValue, record: &Record) -> Option<bool> {
    let result = match test {
        FieldTest::Equals(col) => compare_column(record.column_or_id(col).as_ref(), value) == Some(Ordering::Equal),
        FieldTest::NotEquals(col) => matches!(
            compare_column(record.column_or_id(col).as_ref(), value),
            Some(o) if o != Ordering::Equal
        ),
        FieldTest::Like(col) => match (value, record.column(col)) {
            (FieldValue::Text(pattern), Some(VariableValue::String(s))) => like_match(s, pattern),
            _ => false,
        },
        FieldTest::In(col) | FieldTest::NotIn(col) => {
            let column = record.column_or_id(col);
            match (value, column.as_ref().and_then(VariableValue::as_str)) {
                (FieldValue::TextList(items), Some(s)) => {
                    let found = items.iter().any(|i| i == s);
                    found == matches!(test, FieldTest::In(_))
                }
                _ => false,
            }
        }
        FieldTest::GreaterThan(col) => compare_column(record.column(col), value) == Some(Ordering::Greater),
        FieldTest::LessThan(col) => compare_column(record.column(col), value) == Some(Ordering::Less),
        FieldTest::AtLeast(col) => matches!(
            compare_column(record.column(col), value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FieldTest::AtMost(col) => matches!(
            compare_column(record.column(col), value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        FieldTest::Present(col) => record.column(col).is_some(),
        FieldTest::Absent(col) => record.column(col).is_none(),
        FieldTest::Suspension(col) => {
            let suspended = matches!(record.column(col), Some(VariableValue::Boolean(true)));
            match value {
                FieldValue::Suspension(SuspensionState::Active) => !suspended,
                FieldValue::Suspension(SuspensionState::Suspended) => suspended,
                _ => false,
            }
        }
        FieldTest::CandidateGroupLike => value
            .as_text()
            .is_some_and(|pattern| record.candidate_groups.iter().any(|g| like_match(g, pattern))),
        FieldTest::HasCandidateGroups => !record.candidate_groups.is_empty(),
        FieldTest::NoCandidateGroups => record.candidate_groups.is_empty(),
        FieldTest::HasCandidateUsers => !record.candidate_users.is_empty(),
        FieldTest::NoCandidateUsers => record.candidate_users.is_empty(),
        FieldTest::Candidate | FieldTest::Modifier => return None,
    };
    Some(result)
}

/// Whether a failed test passes anyway because its column is missing and
/// the predicate accepts that.
fn accepts_missing_column<E: EntityKind>(
    descriptor: &FieldDescriptor<E::Field>,
    predicate: &Predicate<E>,
    record: &Record,
) -> bool {
    let Some(flag) = descriptor.null_accepted_by else {
        return false;
    };
    predicate.is_set(flag)
        && descriptor
            .test
            .column()
            .is_some_and(|col| record.column(col).is_none())
}

fn ordering_satisfies(operator: QueryOperator, ordering: Ordering) -> bool {
    match operator {
        QueryOperator::Equals => ordering == Ordering::Equal,
        QueryOperator::NotEquals => ordering != Ordering::Equal,
        QueryOperator::GreaterThan => ordering == Ordering::Greater,
        QueryOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        QueryOperator::LessThan => ordering == Ordering::Less,
        QueryOperator::LessThanOrEqual => ordering != Ordering::Greater,
        QueryOperator::Like | QueryOperator::NotLike => false,
    }
}

/// Compare a stored variable value with a normalized condition.
fn variable_value_matches(condition: &VariableCondition, stored: &VariableValue) -> bool {
    let Some(normalized) = condition.normalized() else {
        return false;
    };
    let operator = condition.operator;

    if condition.value.is_null() {
        return match operator {
            QueryOperator::Equals => stored.is_null(),
            QueryOperator::NotEquals => !stored.is_null(),
            _ => false,
        };
    }
    if stored.is_null() {
        return false;
    }

    if let Some(text) = &normalized.text {
        let Some(stored) = stored.as_str() else {
            return false;
        };
        let stored = if condition.value_ignore_case {
            stored.to_lowercase()
        } else {
            stored.to_string()
        };
        return match operator {
            QueryOperator::Like => like_match(&stored, text),
            QueryOperator::NotLike => !like_match(&stored, text),
            other => ordering_satisfies(other, stored.as_str().cmp(text.as_str())),
        };
    }

    let kind = condition.value.kind();
    let ordering = match (kind, stored) {
        (ValueKind::Boolean, VariableValue::Boolean(b)) => normalized.long.map(|l| i64::from(*b).cmp(&l)),
        (ValueKind::Date, VariableValue::Date(ms) | VariableValue::Long(ms)) => {
            normalized.long.map(|l| ms.cmp(&l))
        }
        (k, s) if k.is_numeric() && s.kind().is_numeric() => {
            let expected = normalized.double.or(normalized.long.map(|l| l as f64));
            match (s.as_f64(), expected) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            }
        }
        _ => None,
    };
    ordering.is_some_and(|o| ordering_satisfies(operator, o))
}

fn compare_sort_values(a: Option<&VariableValue>, b: Option<&VariableValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => match (a, b) {
                (VariableValue::Boolean(x), VariableValue::Boolean(y)) => x.cmp(y),
                (VariableValue::Date(x), VariableValue::Date(y)) => x.cmp(y),
                _ => match (a.as_f64().or(a.as_i64().map(|v| v as f64)), b.as_f64().or(b.as_i64().map(|v| v as f64))) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    _ => Ordering::Equal,
                },
            },
        },
    }
}

/// Execution sink over an in-memory record list.
pub struct MemoryStore<E: EntityKind> {
    records: Vec<Record>,
    _entity: PhantomData<E>,
}

impl<E: EntityKind> Default for MemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKind> MemoryStore<E> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            _entity: PhantomData,
        }
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            _entity: PhantomData,
        }
    }

    /// Load records from a JSON array.
    pub fn from_json(value: &serde_json::Value) -> QueryResult<Self> {
        let items = value
            .as_array()
            .ok_or_else(|| QueryError::Json("records must be a JSON array".to_string()))?;
        let records = items.iter().map(Record::from_json).collect::<QueryResult<Vec<_>>>()?;
        Ok(Self::with_records(records))
    }

    pub fn insert(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `record` satisfies the root and every `or()` group.
    pub fn matches(&self, query: &PreparedQuery<E>, record: &Record) -> bool {
        query.predicates().all(|p| self.matches_predicate(p, record))
    }

    fn matches_predicate(&self, predicate: &Predicate<E>, record: &Record) -> bool {
        let mut terms = Vec::new();
        for (field, value) in predicate.fields() {
            if let Some(descriptor) = E::descriptor(field) {
                if let Some(mut result) = field_matches(descriptor.test, value, record) {
                    if !result && accepts_missing_column(descriptor, predicate, record) {
                        result = true;
                    }
                    terms.push(result);
                }
            }
        }
        if let Some(result) = self.candidate_term(predicate, record) {
            terms.push(result);
        }
        for condition in predicate.variables() {
            let matched = record
                .variables
                .iter()
                .filter(|v| v.scope == condition.scope && condition.matches_name(&v.name))
                .any(|v| variable_value_matches(condition, &v.value));
            terms.push(matched);
        }

        if predicate.is_disjunct() {
            terms.is_empty() || terms.iter().any(|t| *t)
        } else {
            terms.iter().all(|t| *t)
        }
    }

    /// Candidate user and resolved candidate groups, evaluated as one term.
    fn candidate_term(&self, predicate: &Predicate<E>, record: &Record) -> Option<bool> {
        let fields = E::candidate_fields()?;
        let user = predicate.text(fields.user);
        let groups = predicate.candidate_groups();
        if user.is_none() && groups.is_none() {
            return None;
        }
        let linked = user.is_some_and(|u| record.candidate_users.iter().any(|c| c == u))
            || groups.is_some_and(|g| record.candidate_groups.iter().any(|c| g.contains(c)));
        if predicate.is_set(fields.include_assigned) {
            Some(linked)
        } else {
            Some(linked && record.column(fields.assignee_column).is_none())
        }
    }

    fn sort_value(record: &Record, target: &OrderTarget) -> Option<VariableValue> {
        match target {
            OrderTarget::Property(key) => record.column_or_id(key),
            OrderTarget::Variable { name, scope, .. } => record
                .variables
                .iter()
                .find(|v| v.scope == *scope && v.name == *name)
                .map(|v| v.value.clone())
                .filter(|v| !v.is_null()),
        }
    }

    fn matching(&self, query: &PreparedQuery<E>) -> Vec<&Record> {
        let mut matched: Vec<&Record> = self.records.iter().filter(|r| self.matches(query, r)).collect();
        let ordering = query.root.ordering();
        matched.sort_by(|a, b| {
            for property in ordering {
                let ord = compare_sort_values(
                    Self::sort_value(a, &property.target).as_ref(),
                    Self::sort_value(b, &property.target).as_ref(),
                );
                let ord = match property.direction {
                    OrderDirection::Asc => ord,
                    OrderDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.id.cmp(&b.id)
        });
        matched
    }
}

impl<E: EntityKind> ExecutionSink<E> for MemoryStore<E> {
    type Item = Record;

    fn count(&self, query: &PreparedQuery<E>) -> Result<u64, BoxError> {
        Ok(self.matching(query).len() as u64)
    }

    fn list(&self, query: &PreparedQuery<E>, page: Option<Page>) -> Result<Vec<Record>, BoxError> {
        let matched = self.matching(query);
        let page = page.unwrap_or(Page::new(0, usize::MAX));
        Ok(matched
            .into_iter()
            .skip(page.first)
            .take(page.max)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_filter_basic() {
        assert!(like_match("hello", "hello"));
        assert!(!like_match("hello", "world"));
        assert!(like_match("", ""));
        assert!(!like_match("a", ""));
    }

    #[test]
    fn test_like_filter_percent() {
        assert!(like_match("invoice-2024", "invoice%"));
        assert!(like_match("invoice-2024", "%2024"));
        assert!(like_match("invoice-2024", "%ice-%"));
        assert!(like_match("anything", "%"));
        assert!(!like_match("invoice", "%bill%"));
    }

    #[test]
    fn test_like_filter_many_wildcards() {
        let value = "a".repeat(60);
        assert!(!like_match(&value, &format!("{}b", "%a".repeat(30))));
        assert!(like_match(&value, &"%a".repeat(30)));
        assert!(like_match("a-b-c-d", "%-%-%-%"));
        assert!(!like_match("a-b-c", "%-%-%-%"));
        assert!(like_match("path\\", "path\\"));
    }

    #[test]
    fn test_like_filter_underscore() {
        assert!(like_match("cat", "c_t"));
        assert!(!like_match("cart", "c_t"));
        assert!(like_match("cart", "c__t"));
    }

    #[test]
    fn test_like_filter_escape() {
        assert!(like_match("100%", "100\\%"));
        assert!(!like_match("1000", "100\\%"));
        assert!(like_match("a_b", "a\\_b"));
        assert!(!like_match("axb", "a\\_b"));
    }

    #[test]
    fn test_compare_column() {
        let ts = chrono::DateTime::from_timestamp_millis(1_000).unwrap();
        assert_eq!(
            compare_column(Some(&VariableValue::Long(2_000)), &FieldValue::Timestamp(ts)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_column(Some(&VariableValue::Double(5.0)), &FieldValue::Integer(5)),
            Some(Ordering::Equal)
        );
        assert_eq!(compare_column(None, &FieldValue::Integer(5)), None);
        assert_eq!(
            compare_column(Some(&VariableValue::from("b")), &FieldValue::Text("a".into())),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_record_json_roundtrip() {
        let record = Record::new("t1")
            .with_column("name", "Review invoice")
            .with_column("priority", 50i64)
            .with_variable("amount", VariableScope::ProcessInstance, 900i64)
            .with_candidate_group("accounting");
        let decoded = Record::from_json(&record.to_json()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_record_requires_id() {
        let err = Record::from_json(&json!({"columns": {}})).unwrap_err();
        assert!(matches!(err, QueryError::Json(_)));
    }

    #[test]
    fn test_sort_values() {
        assert_eq!(compare_sort_values(None, Some(&VariableValue::Long(1))), Ordering::Less);
        assert_eq!(
            compare_sort_values(Some(&VariableValue::Long(2)), Some(&VariableValue::Integer(10))),
            Ordering::Less
        );
    }
}
