//! End-to-end tests for composing, merging and executing queries.

use chrono::{TimeZone, Utc};
use flowquery_core::entity::{HistoricProcessInstanceQuery, Task, TaskField, TaskQuery};
use flowquery_core::filter::{from_json, to_json};
use flowquery_core::query::{EmptyReason, Page};
use flowquery_core::security::IdentityProvider;
use flowquery_core::{
    BoxError, DefaultSerializers, Dialect, EngineConfig, ExecutionSink, FilterService,
    MemoryIdentityProvider, MemoryStore, OrderDirection, Plan, PreparedQuery, QueryContext,
    QueryError, Record, SavedFilter, VariableScope, VariableValue,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fails the test if the query reaches the executor.
struct UnreachableSink;

impl ExecutionSink<Task> for UnreachableSink {
    type Item = Record;

    fn count(&self, _query: &PreparedQuery<Task>) -> Result<u64, BoxError> {
        panic!("unsatisfiable query was executed");
    }

    fn list(&self, _query: &PreparedQuery<Task>, _page: Option<Page>) -> Result<Vec<Record>, BoxError> {
        panic!("unsatisfiable query was executed");
    }
}

struct CountingIdentity {
    inner: MemoryIdentityProvider,
    calls: AtomicUsize,
}

impl CountingIdentity {
    fn new(inner: MemoryIdentityProvider) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for CountingIdentity {
    fn groups_of_user(&self, user_id: &str) -> Result<Vec<String>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.groups_of_user(user_id)
    }
}

struct FailingIdentity;

impl IdentityProvider for FailingIdentity {
    fn groups_of_user(&self, user_id: &str) -> Result<Vec<String>, BoxError> {
        Err(format!("directory unavailable for {}", user_id).into())
    }
}

fn identity() -> MemoryIdentityProvider {
    MemoryIdentityProvider::new()
        .with_membership("kermit", "accounting")
        .with_membership("kermit", "management")
        .with_membership("gonzo", "sales")
}

fn tasks() -> MemoryStore<Task> {
    MemoryStore::with_records(vec![
        Record::new("t1")
            .with_column("name", "Approve invoice")
            .with_column("priority", 80i64)
            .with_column("due", VariableValue::Date(1_704_067_200_000))
            .with_variable("amount", VariableScope::ProcessInstance, 900i64)
            .with_variable("customer", VariableScope::ProcessInstance, "ACME Corp")
            .with_candidate_group("accounting"),
        Record::new("t2")
            .with_column("name", "Review invoice")
            .with_column("priority", 20i64)
            .with_column("assignee", "fozzie")
            .with_variable("amount", VariableScope::ProcessInstance, 50i64)
            .with_candidate_group("accounting"),
        Record::new("t3")
            .with_column("name", "Call customer")
            .with_column("priority", 50i64)
            .with_variable("customer", VariableScope::ProcessInstance, "")
            .with_candidate_user("gonzo"),
        Record::new("t4")
            .with_column("name", "Plan budget")
            .with_column("priority", 50i64)
            .with_column("suspended", true)
            .with_candidate_group("management"),
    ])
}

fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn test_illegal_operator_value_pairs() {
    let mut query = TaskQuery::new();
    let err = query
        .process_variable_value_greater_than("approved", true)
        .unwrap_err();
    assert!(err.is_usage_error());
    assert!(err
        .to_string()
        .contains("Booleans and null cannot be used in 'greater than' condition"));

    assert!(query
        .process_variable_value_less_than("x", VariableValue::Null)
        .is_err());
    assert!(query
        .process_variable_value_equals("x", VariableValue::Null)
        .is_ok());
    assert!(query
        .process_variable_value_not_equals("x", false)
        .is_ok());
}

#[test]
fn test_or_protocol() {
    let mut query = TaskQuery::new();
    assert!(query.end_or().is_err());

    query.or().unwrap();
    let err = query.or().unwrap_err();
    assert_eq!(err.to_string(), "invalid query usage: cannot set or() within 'or' query");
    let first = query.current_disjunct().unwrap();
    query.end_or().unwrap();

    query.or().unwrap();
    assert!(query.end_disjunct(first).is_err());
    let second = query.current_disjunct().unwrap();
    query.end_disjunct(second).unwrap();
    assert!(query.end_disjunct(second).is_err());
    assert!(!query.is_or_active());
    assert_eq!(query.disjuncts().len(), 2);
}

#[test]
fn test_case_toggles_are_retroactive() {
    let mut query = TaskQuery::new();
    query.process_variable_value_equals("Customer", "ACME").unwrap();
    query.or().unwrap().task_variable_value_equals("Region", "EU").unwrap();
    query.match_variable_values_ignore_case();
    query.match_variable_names_ignore_case();
    query.process_variable_value_equals("Owner", "X").unwrap();
    query.end_or().unwrap();

    let all: Vec<_> = query
        .root()
        .variables()
        .iter()
        .chain(query.disjuncts()[0].variables())
        .collect();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|c| c.name_ignore_case && c.value_ignore_case));
}

#[test]
fn test_extend_scalars_and_flags() {
    let mut base = TaskQuery::new();
    base.task_name("Approve").unwrap().task_unassigned().unwrap();
    let mut extension = TaskQuery::new();
    extension.task_name("Review").unwrap().task_priority(5).unwrap();

    let merged = base.extend(&extension).unwrap();
    assert_eq!(merged.root().text(TaskField::Name), Some("Review"));
    assert!(merged.root().is_set(TaskField::Unassigned));
    assert!(merged.root().is_set(TaskField::Priority));

    // inputs untouched
    assert_eq!(base.root().text(TaskField::Name), Some("Approve"));
    assert!(!extension.root().is_set(TaskField::Unassigned));
}

#[test]
fn test_extend_flags_associative() {
    let mut a = TaskQuery::new();
    a.task_assigned().unwrap();
    let mut b = TaskQuery::new();
    b.exclude_subtasks().unwrap().match_variable_names_ignore_case();
    let mut c = TaskQuery::new();
    c.without_due_date().unwrap();

    let left = a.extend(&b).unwrap().extend(&c).unwrap();
    let right = a.extend(&b.extend(&c).unwrap()).unwrap();
    assert_eq!(to_json(&left).unwrap(), to_json(&right).unwrap());
    assert!(left.variable_names_ignore_case());
}

#[test]
fn test_extend_replaces_collections() {
    let mut base = TaskQuery::new();
    base.task_candidate_group_in(["accounting", "sales"]).unwrap();
    let mut extension = TaskQuery::new();
    extension.task_candidate_group_in(["management"]).unwrap();

    let merged = base.extend(&extension).unwrap();
    assert_eq!(
        merged.root().list(TaskField::CandidateGroups),
        Some(&["management".to_string()][..])
    );
}

#[test]
fn test_extend_variables_and_ordering() {
    let mut base = TaskQuery::new();
    base.process_variable_value_greater_than("amount", 100i64)
        .unwrap()
        .process_variable_value_equals("customer", "ACME")
        .unwrap()
        .order_by_task_name(OrderDirection::Asc)
        .unwrap();
    let mut extension = TaskQuery::new();
    extension
        .process_variable_value_less_than("amount", 50i64)
        .unwrap()
        .task_variable_value_equals("amount", 1i64)
        .unwrap()
        .order_by_task_name(OrderDirection::Asc)
        .unwrap();

    let merged = base.extend(&extension).unwrap();
    let variables: Vec<(&str, VariableScope)> = merged
        .root()
        .variables()
        .iter()
        .map(|c| (c.name.as_str(), c.scope))
        .collect();
    assert_eq!(
        variables,
        vec![
            ("amount", VariableScope::ProcessInstance),
            ("amount", VariableScope::TaskLocal),
            ("customer", VariableScope::ProcessInstance),
        ]
    );
    assert_eq!(merged.root().ordering().len(), 2);
}

#[test]
fn test_extend_rejects_illegal_combination() {
    let mut base = TaskQuery::new();
    base.task_candidate_user("kermit").unwrap();
    let mut extension = TaskQuery::new();
    extension.task_candidate_group("sales").unwrap();
    assert!(base.extend(&extension).unwrap_err().is_usage_error());
}

#[test]
fn test_disjoint_candidate_groups_short_circuit() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);

    let mut query = TaskQuery::new();
    query
        .task_candidate_group("accounting")
        .unwrap()
        .task_candidate_group_in(["sales", "management"])
        .unwrap();
    assert!(matches!(query.prepare(&ctx).unwrap(), Plan::Empty(EmptyReason::NoCandidateGroups)));
    assert_eq!(query.count(&ctx, &UnreachableSink).unwrap(), 0);
    assert!(query.list_page(&ctx, &UnreachableSink, 0, 10).unwrap().is_empty());
}

#[test]
fn test_disjoint_candidate_groups_short_circuit_with_assigned_tasks() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);

    let mut query = TaskQuery::new();
    query
        .task_candidate_group("g1")
        .unwrap()
        .task_candidate_group_in(["g2", "g3"])
        .unwrap()
        .include_assigned_tasks()
        .unwrap();
    assert!(matches!(query.prepare(&ctx).unwrap(), Plan::Empty(EmptyReason::NoCandidateGroups)));
    assert_eq!(query.count(&ctx, &UnreachableSink).unwrap(), 0);
    assert!(query.list_page(&ctx, &UnreachableSink, 0, 10).unwrap().is_empty());
}

#[test]
fn test_candidate_user_without_groups_still_executes() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);

    // an unknown user resolves to no groups, which is not an empty intersection
    let mut query = TaskQuery::new();
    query.task_candidate_user("nobody").unwrap();
    assert!(matches!(query.prepare(&ctx).unwrap(), Plan::Execute(_)));
}

#[test]
fn test_follow_up_before_or_not_existent() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);
    let store = MemoryStore::<Task>::with_records(vec![
        Record::new("early").with_column("followUp", VariableValue::Date(1_000)),
        Record::new("late").with_column("followUp", VariableValue::Date(50_000)),
        Record::new("none"),
    ]);
    let cutoff = Utc.timestamp_millis_opt(10_000).unwrap();

    let mut query = TaskQuery::new();
    query.follow_up_before(cutoff).unwrap();
    assert_eq!(ids(&query.list(&ctx, &store).unwrap()), vec!["early"]);

    let mut query = TaskQuery::new();
    query.follow_up_before_or_not_existent(cutoff).unwrap();
    assert_eq!(ids(&query.list(&ctx, &store).unwrap()), vec!["early", "none"]);
}

#[test]
fn test_candidate_groups_union_in_or() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);

    let mut query = TaskQuery::new();
    query
        .or()
        .unwrap()
        .task_candidate_group("accounting")
        .unwrap()
        .task_candidate_group_in(["management"])
        .unwrap()
        .end_or()
        .unwrap();
    let Plan::Execute(prepared) = query.prepare(&ctx).unwrap() else {
        panic!("expected an executable plan");
    };
    let groups: Vec<&str> = prepared.disjuncts[0]
        .candidate_groups()
        .unwrap()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(groups, vec!["accounting", "management"]);

    let store = tasks();
    let found = query.list(&ctx, &store).unwrap();
    // t2 is assigned and t4 only matches through management
    assert_eq!(ids(&found), vec!["t1", "t4"]);
}

#[test]
fn test_candidate_user_and_assigned_tasks() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);
    let store = tasks();

    let mut query = TaskQuery::new();
    query.task_candidate_user("kermit").unwrap();
    assert_eq!(ids(&query.list(&ctx, &store).unwrap()), vec!["t1", "t4"]);

    query.include_assigned_tasks().unwrap();
    assert_eq!(ids(&query.list(&ctx, &store).unwrap()), vec!["t1", "t2", "t4"]);

    let mut query = TaskQuery::new();
    query.task_candidate_user("gonzo").unwrap();
    assert_eq!(ids(&query.list(&ctx, &store).unwrap()), vec!["t3"]);
}

#[test]
fn test_user_group_cache() {
    let serializers = DefaultSerializers::new();
    let build = || {
        let mut query = TaskQuery::new();
        query
            .or()
            .unwrap()
            .task_candidate_user("kermit")
            .unwrap()
            .task_name("x")
            .unwrap()
            .end_or()
            .unwrap()
            .or()
            .unwrap()
            .task_candidate_user("kermit")
            .unwrap()
            .end_or()
            .unwrap();
        query
    };

    let cached = EngineConfig::default();
    let identity = CountingIdentity::new(identity());
    let ctx = QueryContext::new(&cached, &serializers, &identity);
    build().prepare(&ctx).unwrap();
    assert_eq!(identity.calls(), 1);

    let uncached = EngineConfig::default().with_user_group_cache(false);
    let identity = CountingIdentity::new(self::identity());
    let ctx = QueryContext::new(&uncached, &serializers, &identity);
    let mut query = build();
    query.prepare(&ctx).unwrap();
    assert_eq!(identity.calls(), 2);

    // resolved groups stay valid until a candidate filter changes
    query.prepare(&ctx).unwrap();
    assert_eq!(identity.calls(), 2);
}

#[test]
fn test_identity_errors_propagate() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let ctx = QueryContext::new(&config, &serializers, &FailingIdentity);

    let mut query = TaskQuery::new();
    query.task_candidate_user("kermit").unwrap();
    let err = query.count(&ctx, &UnreachableSink).unwrap_err();
    assert!(matches!(err, QueryError::Identity(_)));
    assert!(err.to_string().contains("directory unavailable for kermit"));
}

#[test]
fn test_inverted_due_window_short_circuits() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);
    let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

    let mut query = TaskQuery::new();
    query.due_after(late).unwrap().due_before(early).unwrap();
    match query.prepare(&ctx).unwrap() {
        Plan::Empty(EmptyReason::RangeNotAscending(keys)) => {
            assert_eq!(keys, vec!["dueAfter", "due", "dueBefore"]);
        }
        other => panic!("unexpected plan {:?}", other),
    }
    assert_eq!(query.count(&ctx, &UnreachableSink).unwrap(), 0);

    // inside an or group the window only removes one alternative
    let mut query = TaskQuery::new();
    query
        .or()
        .unwrap()
        .due_after(late)
        .unwrap()
        .due_before(early)
        .unwrap()
        .end_or()
        .unwrap();
    assert!(matches!(query.prepare(&ctx).unwrap(), Plan::Execute(_)));
}

#[test]
fn test_variable_filters_execute() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);
    let store = tasks();

    let mut query = TaskQuery::new();
    query
        .process_variable_value_greater_than_or_equals("amount", 100i64)
        .unwrap();
    assert_eq!(ids(&query.list(&ctx, &store).unwrap()), vec!["t1"]);

    let mut query = TaskQuery::new();
    query
        .process_variable_value_like("customer", "acme%")
        .unwrap()
        .match_variable_values_ignore_case();
    assert_eq!(ids(&query.list(&ctx, &store).unwrap()), vec!["t1"]);
    // the raw value is kept as written
    assert_eq!(query.root().variables()[0].value, VariableValue::from("acme%"));
}

#[test]
fn test_oracle_empty_string_flag() {
    let serializers = DefaultSerializers::new();
    let identity = identity();

    for (dialect, expected) in [(Dialect::Oracle, true), (Dialect::Postgres, false)] {
        let config = EngineConfig::new(dialect);
        let ctx = QueryContext::new(&config, &serializers, &identity);
        let mut query = TaskQuery::new();
        query.process_variable_value_equals("customer", "").unwrap();
        query.prepare(&ctx).unwrap();
        query.prepare(&ctx).unwrap();
        let normalized = query.root().variables()[0].normalized().unwrap();
        assert_eq!(normalized.find_nulled_empty_strings, expected);
        assert_eq!(normalized.text.as_deref(), Some(""));
    }
}

#[test]
fn test_or_groups_and_paging() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);
    let store = tasks();

    let mut query = TaskQuery::new();
    query
        .active()
        .unwrap()
        .order_by_task_priority(OrderDirection::Desc)
        .unwrap()
        .or()
        .unwrap()
        .task_name_like("%invoice")
        .unwrap()
        .task_min_priority(50)
        .unwrap()
        .end_or()
        .unwrap();
    // t4 is suspended
    assert_eq!(ids(&query.list(&ctx, &store).unwrap()), vec!["t1", "t3", "t2"]);
    assert_eq!(query.count(&ctx, &store).unwrap(), 3);
    assert_eq!(ids(&query.list_page(&ctx, &store, 1, 1).unwrap()), vec!["t3"]);
}

#[test]
fn test_max_results_limit() {
    let config = EngineConfig::default().with_query_max_results(2);
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);
    let store = tasks();

    let mut query = TaskQuery::new();
    assert!(query.list(&ctx, &store).unwrap_err().is_usage_error());
    assert!(query.list_page(&ctx, &store, 0, 3).unwrap_err().is_usage_error());
    assert_eq!(query.list_page(&ctx, &store, 0, 2).unwrap().len(), 2);
}

#[test]
fn test_saved_filter_roundtrip_and_execution() {
    let config = EngineConfig::default();
    let serializers = DefaultSerializers::new();
    let identity = identity();
    let ctx = QueryContext::new(&config, &serializers, &identity);
    let store = tasks();

    let stored = json!({
        "candidateGroup": "accounting",
        "processVariables": [{"name": "amount", "operator": "GREATER_THAN", "value": 10}],
        "orderingProperties": [{"sortBy": "priority", "sortOrder": "asc"}],
    });
    let query = from_json::<Task>(&stored).unwrap();
    assert_eq!(to_json(&query).unwrap(), stored);

    let service = FilterService::new();
    let filter = service
        .create(SavedFilter::from_query("Accounting", &query).unwrap())
        .unwrap();
    assert_eq!(ids(&service.list_results(&filter.id, None, &ctx, &store).unwrap()), vec!["t1"]);

    let mut extension = TaskQuery::new();
    extension.include_assigned_tasks().unwrap_err();
    extension.task_candidate_group("accounting").unwrap().include_assigned_tasks().unwrap();
    let found = service
        .list_results(&filter.id, Some(&extension), &ctx, &store)
        .unwrap();
    assert_eq!(ids(&found), vec!["t2", "t1"]);
    assert_eq!(service.count(&filter.id, Some(&extension), &ctx, &store).unwrap(), 2);

    let missing = service.count::<Task, _>("nope", None, &ctx, &store).unwrap_err();
    assert!(matches!(missing, QueryError::FilterNotFound(_)));
}

#[test]
fn test_historic_variables_roundtrip() {
    let mut query = HistoricProcessInstanceQuery::new();
    query
        .finished()
        .unwrap()
        .variable_value_not_equals("status", "open")
        .unwrap();
    let encoded = to_json(&query).unwrap();
    assert_eq!(
        encoded,
        json!({
            "finished": true,
            "processVariables": [{"name": "status", "operator": "NOT_EQUALS", "value": "open"}],
        })
    );
}
