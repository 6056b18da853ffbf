//! Task queries.

use crate::error::QueryResult;
use crate::query::entity::{CandidateFields, EntityKind, ExcludedWhen, MembershipCheck, RangeCheck};
use crate::query::field::{ExclusionRule, FieldDescriptor, FieldTest, SuspensionState};
use crate::query::Query;
use chrono::{DateTime, Utc};
use flowquery_proto::{OrderDirection, ValueKind, VariableScope};

/// User tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Task;

/// Query over user tasks.
pub type TaskQuery = Query<Task>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskField {
    TaskId,
    TaskIdIn,
    Name,
    NameNotEqual,
    NameLike,
    Description,
    DescriptionLike,
    Priority,
    MinPriority,
    MaxPriority,
    Assignee,
    AssigneeLike,
    AssigneeIn,
    AssigneeNotIn,
    Owner,
    Assigned,
    Unassigned,
    CandidateUser,
    CandidateGroup,
    CandidateGroups,
    CandidateGroupLike,
    IncludeAssignedTasks,
    WithCandidateGroups,
    WithoutCandidateGroups,
    WithCandidateUsers,
    WithoutCandidateUsers,
    ProcessInstanceId,
    ProcessInstanceIdIn,
    ExecutionId,
    ProcessDefinitionId,
    ProcessDefinitionKey,
    ProcessDefinitionKeys,
    ProcessDefinitionName,
    ProcessDefinitionNameLike,
    BusinessKey,
    BusinessKeys,
    BusinessKeyLike,
    TaskDefinitionKey,
    TaskDefinitionKeys,
    TaskDefinitionKeyNotIn,
    TaskDefinitionKeyLike,
    CaseInstanceId,
    CaseDefinitionKey,
    CaseExecutionId,
    Due,
    DueBefore,
    DueAfter,
    WithoutDueDate,
    FollowUp,
    FollowUpBefore,
    FollowUpAfter,
    FollowUpNullAccepted,
    Created,
    CreatedBefore,
    CreatedAfter,
    ExcludeSubtasks,
    ParentTaskId,
    Suspension,
    TenantIds,
    WithoutTenantId,
    InitializeFormKeys,
}

use TaskField as F;

const CANDIDATE_SOURCES: &[TaskField] = &[
    F::CandidateUser,
    F::CandidateGroup,
    F::CandidateGroups,
    F::CandidateGroupLike,
];

static FIELDS: &[FieldDescriptor<TaskField>] = &[
    FieldDescriptor::text(F::TaskId, "taskId", FieldTest::Equals("id")),
    FieldDescriptor::list(F::TaskIdIn, "taskIdIn", FieldTest::In("id")),
    FieldDescriptor::text(F::Name, "name", FieldTest::Equals("name")),
    FieldDescriptor::text(F::NameNotEqual, "nameNotEqual", FieldTest::NotEquals("name")),
    FieldDescriptor::text(F::NameLike, "nameLike", FieldTest::Like("name")),
    FieldDescriptor::text(F::Description, "description", FieldTest::Equals("description")),
    FieldDescriptor::text(F::DescriptionLike, "descriptionLike", FieldTest::Like("description")),
    FieldDescriptor::integer(F::Priority, "priority", FieldTest::Equals("priority")),
    FieldDescriptor::integer(F::MinPriority, "minPriority", FieldTest::AtLeast("priority")),
    FieldDescriptor::integer(F::MaxPriority, "maxPriority", FieldTest::AtMost("priority")),
    FieldDescriptor::text(F::Assignee, "assignee", FieldTest::Equals("assignee")),
    FieldDescriptor::text(F::AssigneeLike, "assigneeLike", FieldTest::Like("assignee")),
    FieldDescriptor::list(F::AssigneeIn, "assigneeIn", FieldTest::In("assignee")),
    FieldDescriptor::list(F::AssigneeNotIn, "assigneeNotIn", FieldTest::NotIn("assignee")),
    FieldDescriptor::text(F::Owner, "owner", FieldTest::Equals("owner")),
    FieldDescriptor::flag(F::Assigned, "assigned", FieldTest::Present("assignee")),
    FieldDescriptor::flag(F::Unassigned, "unassigned", FieldTest::Absent("assignee")),
    FieldDescriptor::text(F::CandidateUser, "candidateUser", FieldTest::Candidate),
    FieldDescriptor::text(F::CandidateGroup, "candidateGroup", FieldTest::Candidate),
    FieldDescriptor::list(F::CandidateGroups, "candidateGroups", FieldTest::Candidate),
    FieldDescriptor::text(F::CandidateGroupLike, "candidateGroupLike", FieldTest::CandidateGroupLike),
    FieldDescriptor::flag(F::IncludeAssignedTasks, "includeAssignedTasks", FieldTest::Modifier)
        .requires_any(CANDIDATE_SOURCES),
    FieldDescriptor::flag(F::WithCandidateGroups, "withCandidateGroups", FieldTest::HasCandidateGroups)
        .conjunction_only(),
    FieldDescriptor::flag(F::WithoutCandidateGroups, "withoutCandidateGroups", FieldTest::NoCandidateGroups)
        .conjunction_only(),
    FieldDescriptor::flag(F::WithCandidateUsers, "withCandidateUsers", FieldTest::HasCandidateUsers)
        .conjunction_only(),
    FieldDescriptor::flag(F::WithoutCandidateUsers, "withoutCandidateUsers", FieldTest::NoCandidateUsers)
        .conjunction_only(),
    FieldDescriptor::text(F::ProcessInstanceId, "processInstanceId", FieldTest::Equals("processInstanceId")),
    FieldDescriptor::list(F::ProcessInstanceIdIn, "processInstanceIdIn", FieldTest::In("processInstanceId")),
    FieldDescriptor::text(F::ExecutionId, "executionId", FieldTest::Equals("executionId")),
    FieldDescriptor::text(F::ProcessDefinitionId, "processDefinitionId", FieldTest::Equals("processDefinitionId")),
    FieldDescriptor::text(F::ProcessDefinitionKey, "processDefinitionKey", FieldTest::Equals("processDefinitionKey")),
    FieldDescriptor::list(F::ProcessDefinitionKeys, "processDefinitionKeys", FieldTest::In("processDefinitionKey")),
    FieldDescriptor::text(F::ProcessDefinitionName, "processDefinitionName", FieldTest::Equals("processDefinitionName")),
    FieldDescriptor::text(F::ProcessDefinitionNameLike, "processDefinitionNameLike", FieldTest::Like("processDefinitionName")),
    FieldDescriptor::text(F::BusinessKey, "processInstanceBusinessKey", FieldTest::Equals("businessKey")),
    FieldDescriptor::list(F::BusinessKeys, "processInstanceBusinessKeys", FieldTest::In("businessKey")),
    FieldDescriptor::text(F::BusinessKeyLike, "processInstanceBusinessKeyLike", FieldTest::Like("businessKey")),
    FieldDescriptor::text(F::TaskDefinitionKey, "taskDefinitionKey", FieldTest::Equals("taskDefinitionKey")),
    FieldDescriptor::list(F::TaskDefinitionKeys, "taskDefinitionKeys", FieldTest::In("taskDefinitionKey")),
    FieldDescriptor::list(F::TaskDefinitionKeyNotIn, "taskDefinitionKeyNotIn", FieldTest::NotIn("taskDefinitionKey")),
    FieldDescriptor::text(F::TaskDefinitionKeyLike, "taskDefinitionKeyLike", FieldTest::Like("taskDefinitionKey")),
    FieldDescriptor::text(F::CaseInstanceId, "caseInstanceId", FieldTest::Equals("caseInstanceId")),
    FieldDescriptor::text(F::CaseDefinitionKey, "caseDefinitionKey", FieldTest::Equals("caseDefinitionKey")),
    FieldDescriptor::text(F::CaseExecutionId, "caseExecutionId", FieldTest::Equals("caseExecutionId")),
    FieldDescriptor::timestamp(F::Due, "due", FieldTest::Equals("due")),
    FieldDescriptor::timestamp(F::DueBefore, "dueBefore", FieldTest::LessThan("due")),
    FieldDescriptor::timestamp(F::DueAfter, "dueAfter", FieldTest::GreaterThan("due")),
    FieldDescriptor::flag(F::WithoutDueDate, "withoutDueDate", FieldTest::Absent("due")),
    FieldDescriptor::timestamp(F::FollowUp, "followUp", FieldTest::Equals("followUp")),
    FieldDescriptor::timestamp(F::FollowUpBefore, "followUpBefore", FieldTest::LessThan("followUp"))
        .null_accepted_by(F::FollowUpNullAccepted),
    FieldDescriptor::timestamp(F::FollowUpAfter, "followUpAfter", FieldTest::GreaterThan("followUp")),
    FieldDescriptor::flag(F::FollowUpNullAccepted, "followUpNullAccepted", FieldTest::Modifier),
    FieldDescriptor::timestamp(F::Created, "created", FieldTest::Equals("created")),
    FieldDescriptor::timestamp(F::CreatedBefore, "createdBefore", FieldTest::LessThan("created")),
    FieldDescriptor::timestamp(F::CreatedAfter, "createdAfter", FieldTest::GreaterThan("created")),
    FieldDescriptor::flag(F::ExcludeSubtasks, "excludeSubtasks", FieldTest::Absent("parentTaskId")),
    FieldDescriptor::text(F::ParentTaskId, "parentTaskId", FieldTest::Equals("parentTaskId")),
    FieldDescriptor::suspension(F::Suspension, "suspensionState", "suspended"),
    FieldDescriptor::list(F::TenantIds, "tenantIds", FieldTest::In("tenantId")),
    FieldDescriptor::flag(F::WithoutTenantId, "withoutTenantId", FieldTest::Absent("tenantId")),
    FieldDescriptor::flag(F::InitializeFormKeys, "initializeFormKeys", FieldTest::Modifier).conjunction_only(),
];

static EXCLUSIONS: &[ExclusionRule<TaskField>] = &[
    ExclusionRule::conjunction_only(F::CandidateUser, F::CandidateGroup),
    ExclusionRule::conjunction_only(F::CandidateUser, F::CandidateGroups),
    ExclusionRule::conjunction_only(F::CandidateUser, F::CandidateGroupLike),
    ExclusionRule::conjunction_only(F::Due, F::WithoutDueDate),
    ExclusionRule::conjunction_only(F::DueBefore, F::WithoutDueDate),
    ExclusionRule::conjunction_only(F::DueAfter, F::WithoutDueDate),
    ExclusionRule::conjunction_only(F::TenantIds, F::WithoutTenantId),
];

static RANGES: &[RangeCheck<TaskField>] = &[
    RangeCheck { fields: &[F::MinPriority, F::Priority, F::MaxPriority] },
    RangeCheck { fields: &[F::DueAfter, F::Due, F::DueBefore] },
    RangeCheck { fields: &[F::FollowUpAfter, F::FollowUp, F::FollowUpBefore] },
    RangeCheck { fields: &[F::CreatedAfter, F::Created, F::CreatedBefore] },
];

static MEMBERSHIPS: &[MembershipCheck<TaskField>] = &[
    MembershipCheck {
        element: F::TaskDefinitionKey,
        set: F::TaskDefinitionKeys,
        excluded_when: ExcludedWhen::ElementMissingFrom,
    },
    MembershipCheck {
        element: F::TaskDefinitionKey,
        set: F::TaskDefinitionKeyNotIn,
        excluded_when: ExcludedWhen::ElementFoundIn,
    },
    MembershipCheck {
        element: F::ProcessDefinitionKey,
        set: F::ProcessDefinitionKeys,
        excluded_when: ExcludedWhen::ElementMissingFrom,
    },
    MembershipCheck {
        element: F::BusinessKey,
        set: F::BusinessKeys,
        excluded_when: ExcludedWhen::ElementMissingFrom,
    },
];

impl EntityKind for Task {
    const NAME: &'static str = "Task";

    type Field = TaskField;

    fn descriptors() -> &'static [FieldDescriptor<TaskField>] {
        FIELDS
    }

    fn exclusions() -> &'static [ExclusionRule<TaskField>] {
        EXCLUSIONS
    }

    fn range_checks() -> &'static [RangeCheck<TaskField>] {
        RANGES
    }

    fn membership_checks() -> &'static [MembershipCheck<TaskField>] {
        MEMBERSHIPS
    }

    fn variable_scopes() -> &'static [VariableScope] {
        &[
            VariableScope::TaskLocal,
            VariableScope::ProcessInstance,
            VariableScope::CaseInstance,
        ]
    }

    fn sort_keys() -> &'static [&'static str] {
        &[
            "id",
            "name",
            "description",
            "priority",
            "assignee",
            "created",
            "due",
            "followUp",
            "processInstanceId",
            "executionId",
            "caseInstanceId",
            "caseExecutionId",
            "tenantId",
        ]
    }

    fn candidate_fields() -> Option<CandidateFields<TaskField>> {
        Some(CandidateFields {
            user: F::CandidateUser,
            group: F::CandidateGroup,
            groups: F::CandidateGroups,
            include_assigned: F::IncludeAssignedTasks,
            assignee_column: "assignee",
        })
    }
}

impl Query<Task> {
    pub fn task_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::TaskId, id)
    }

    pub fn task_id_in<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, ids: I) -> QueryResult<&mut Self> {
        self.set_list(F::TaskIdIn, ids)
    }

    pub fn task_name(&mut self, name: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::Name, name)
    }

    pub fn task_name_not_equal(&mut self, name: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::NameNotEqual, name)
    }

    pub fn task_name_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::NameLike, pattern)
    }

    pub fn task_description(&mut self, description: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::Description, description)
    }

    pub fn task_description_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::DescriptionLike, pattern)
    }

    pub fn task_priority(&mut self, priority: i64) -> QueryResult<&mut Self> {
        self.set_integer(F::Priority, priority)
    }

    pub fn task_min_priority(&mut self, priority: i64) -> QueryResult<&mut Self> {
        self.set_integer(F::MinPriority, priority)
    }

    pub fn task_max_priority(&mut self, priority: i64) -> QueryResult<&mut Self> {
        self.set_integer(F::MaxPriority, priority)
    }

    pub fn task_assignee(&mut self, assignee: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::Assignee, assignee)
    }

    pub fn task_assignee_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::AssigneeLike, pattern)
    }

    pub fn task_assignee_in<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, assignees: I) -> QueryResult<&mut Self> {
        self.set_list(F::AssigneeIn, assignees)
    }

    pub fn task_assignee_not_in<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        assignees: I,
    ) -> QueryResult<&mut Self> {
        self.set_list(F::AssigneeNotIn, assignees)
    }

    pub fn task_owner(&mut self, owner: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::Owner, owner)
    }

    pub fn task_assigned(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::Assigned)
    }

    pub fn task_unassigned(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::Unassigned)
    }

    /// Tasks the user is a candidate for, directly or through a group.
    pub fn task_candidate_user(&mut self, user: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::CandidateUser, user)
    }

    pub fn task_candidate_group(&mut self, group: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::CandidateGroup, group)
    }

    pub fn task_candidate_group_in<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        groups: I,
    ) -> QueryResult<&mut Self> {
        self.set_list(F::CandidateGroups, groups)
    }

    pub fn task_candidate_group_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::CandidateGroupLike, pattern)
    }

    /// Also return candidate tasks that already have an assignee.
    ///
    /// Requires a candidate user or candidate group filter on the same target.
    pub fn include_assigned_tasks(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::IncludeAssignedTasks)
    }

    pub fn with_candidate_groups(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithCandidateGroups)
    }

    pub fn without_candidate_groups(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithoutCandidateGroups)
    }

    pub fn with_candidate_users(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithCandidateUsers)
    }

    pub fn without_candidate_users(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithoutCandidateUsers)
    }

    pub fn process_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessInstanceId, id)
    }

    pub fn process_instance_id_in<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, ids: I) -> QueryResult<&mut Self> {
        self.set_list(F::ProcessInstanceIdIn, ids)
    }

    pub fn execution_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ExecutionId, id)
    }

    pub fn process_definition_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessDefinitionId, id)
    }

    pub fn process_definition_key(&mut self, key: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessDefinitionKey, key)
    }

    pub fn process_definition_key_in<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        keys: I,
    ) -> QueryResult<&mut Self> {
        self.set_list(F::ProcessDefinitionKeys, keys)
    }

    pub fn process_definition_name(&mut self, name: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessDefinitionName, name)
    }

    pub fn process_definition_name_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessDefinitionNameLike, pattern)
    }

    pub fn process_instance_business_key(&mut self, key: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::BusinessKey, key)
    }

    pub fn process_instance_business_key_in<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        keys: I,
    ) -> QueryResult<&mut Self> {
        self.set_list(F::BusinessKeys, keys)
    }

    pub fn process_instance_business_key_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::BusinessKeyLike, pattern)
    }

    pub fn task_definition_key(&mut self, key: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::TaskDefinitionKey, key)
    }

    pub fn task_definition_key_in<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, keys: I) -> QueryResult<&mut Self> {
        self.set_list(F::TaskDefinitionKeys, keys)
    }

    pub fn task_definition_key_not_in<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        keys: I,
    ) -> QueryResult<&mut Self> {
        self.set_list(F::TaskDefinitionKeyNotIn, keys)
    }

    pub fn task_definition_key_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::TaskDefinitionKeyLike, pattern)
    }

    pub fn case_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::CaseInstanceId, id)
    }

    pub fn case_definition_key(&mut self, key: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::CaseDefinitionKey, key)
    }

    pub fn case_execution_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::CaseExecutionId, id)
    }

    pub fn due_date(&mut self, due: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::Due, due)
    }

    pub fn due_before(&mut self, due: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::DueBefore, due)
    }

    pub fn due_after(&mut self, due: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::DueAfter, due)
    }

    pub fn without_due_date(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithoutDueDate)
    }

    pub fn follow_up_date(&mut self, date: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::FollowUp, date)
    }

    pub fn follow_up_before(&mut self, date: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::FollowUpBefore, date)
    }

    /// Follow-up before `date`, or no follow-up date at all.
    pub fn follow_up_before_or_not_existent(&mut self, date: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::FollowUpBefore, date)?;
        self.set_flag(F::FollowUpNullAccepted)
    }

    pub fn follow_up_after(&mut self, date: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::FollowUpAfter, date)
    }

    pub fn task_created_on(&mut self, created: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::Created, created)
    }

    pub fn task_created_before(&mut self, created: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::CreatedBefore, created)
    }

    pub fn task_created_after(&mut self, created: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::CreatedAfter, created)
    }

    pub fn exclude_subtasks(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::ExcludeSubtasks)
    }

    pub fn task_parent_task_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ParentTaskId, id)
    }

    pub fn active(&mut self) -> QueryResult<&mut Self> {
        self.set_suspension(F::Suspension, SuspensionState::Active)
    }

    pub fn suspended(&mut self) -> QueryResult<&mut Self> {
        self.set_suspension(F::Suspension, SuspensionState::Suspended)
    }

    pub fn tenant_id_in<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, tenants: I) -> QueryResult<&mut Self> {
        self.set_list(F::TenantIds, tenants)
    }

    pub fn without_tenant_id(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithoutTenantId)
    }

    pub fn initialize_form_keys(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::InitializeFormKeys)
    }

    variable_filters!(
        VariableScope::TaskLocal,
        task_variable_value,
        task_variable_value_equals,
        task_variable_value_not_equals,
        task_variable_value_greater_than,
        task_variable_value_greater_than_or_equals,
        task_variable_value_less_than,
        task_variable_value_less_than_or_equals,
        task_variable_value_like,
        task_variable_value_not_like
    );

    variable_filters!(
        VariableScope::ProcessInstance,
        process_variable_value,
        process_variable_value_equals,
        process_variable_value_not_equals,
        process_variable_value_greater_than,
        process_variable_value_greater_than_or_equals,
        process_variable_value_less_than,
        process_variable_value_less_than_or_equals,
        process_variable_value_like,
        process_variable_value_not_like
    );

    variable_filters!(
        VariableScope::CaseInstance,
        case_instance_variable_value,
        case_instance_variable_value_equals,
        case_instance_variable_value_not_equals,
        case_instance_variable_value_greater_than,
        case_instance_variable_value_greater_than_or_equals,
        case_instance_variable_value_less_than,
        case_instance_variable_value_less_than_or_equals,
        case_instance_variable_value_like,
        case_instance_variable_value_not_like
    );

    pub fn order_by_task_id(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("id", direction)
    }

    pub fn order_by_task_name(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("name", direction)
    }

    pub fn order_by_task_priority(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("priority", direction)
    }

    pub fn order_by_task_assignee(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("assignee", direction)
    }

    pub fn order_by_task_create_time(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("created", direction)
    }

    pub fn order_by_due_date(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("due", direction)
    }

    pub fn order_by_follow_up_date(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("followUp", direction)
    }

    pub fn order_by_process_instance_id(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("processInstanceId", direction)
    }

    pub fn order_by_tenant_id(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("tenantId", direction)
    }

    pub fn order_by_process_variable(
        &mut self,
        name: impl Into<String>,
        kind: ValueKind,
        direction: OrderDirection,
    ) -> QueryResult<&mut Self> {
        self.order_by_variable(name, VariableScope::ProcessInstance, kind, direction)
    }

    pub fn order_by_task_variable(
        &mut self,
        name: impl Into<String>,
        kind: ValueKind,
        direction: OrderDirection,
    ) -> QueryResult<&mut Self> {
        self.order_by_variable(name, VariableScope::TaskLocal, kind, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    fn usage_message(err: QueryError) -> String {
        assert!(err.is_usage_error(), "{:?}", err);
        err.to_string()
    }

    #[test]
    fn test_keys_unique() {
        let mut keys: Vec<&str> = FIELDS.iter().map(|d| d.key).collect();
        keys.sort_unstable();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn test_candidate_user_excludes_groups_on_root() {
        let mut query = TaskQuery::new();
        query.task_candidate_user("kermit").unwrap();
        let err = query.task_candidate_group("sales").unwrap_err();
        assert_eq!(
            usage_message(err),
            "invalid query usage: cannot set both candidateUser and candidateGroup"
        );

        let mut query = TaskQuery::new();
        query.task_candidate_group_in(["sales"]).unwrap();
        assert!(query.task_candidate_user("kermit").is_err());
    }

    #[test]
    fn test_candidate_user_and_group_allowed_in_or() {
        let mut query = TaskQuery::new();
        query
            .or()
            .unwrap()
            .task_candidate_user("kermit")
            .unwrap()
            .task_candidate_group("sales")
            .unwrap()
            .end_or()
            .unwrap();
        assert_eq!(query.disjuncts().len(), 1);
    }

    #[test]
    fn test_without_due_date_exclusion() {
        let mut query = TaskQuery::new();
        query.without_due_date().unwrap();
        let err = query.due_before(Utc::now()).unwrap_err();
        assert!(usage_message(err).contains("cannot set both dueBefore and withoutDueDate"));
    }

    #[test]
    fn test_conjunction_only_fields_rejected_in_or() {
        let mut query = TaskQuery::new();
        query.or().unwrap();
        let err = query.with_candidate_groups().unwrap_err();
        assert_eq!(
            usage_message(err),
            "invalid query usage: cannot set withCandidateGroups within 'or' query"
        );
        assert!(query.initialize_form_keys().is_err());
        assert!(query.order_by_task_name(OrderDirection::Asc).is_err());
        assert!(query.root().is_empty());
        assert!(query.disjuncts()[0].is_empty());
    }

    #[test]
    fn test_include_assigned_requires_candidate_filter() {
        let mut query = TaskQuery::new();
        let err = query.include_assigned_tasks().unwrap_err();
        assert!(usage_message(err).contains("has to be set before 'includeAssignedTasks'"));

        query.task_candidate_group("sales").unwrap().include_assigned_tasks().unwrap();
        assert!(query.root().is_set(F::IncludeAssignedTasks));
    }

    #[test]
    fn test_variable_scopes() {
        let mut query = TaskQuery::new();
        query
            .task_variable_value_equals("approved", true)
            .unwrap()
            .process_variable_value_greater_than("amount", 100i64)
            .unwrap()
            .case_instance_variable_value_like("customer", "Acme%")
            .unwrap();
        let scopes: Vec<VariableScope> = query.root().variables().iter().map(|c| c.scope).collect();
        assert_eq!(
            scopes,
            vec![
                VariableScope::TaskLocal,
                VariableScope::ProcessInstance,
                VariableScope::CaseInstance
            ]
        );
    }

    #[test]
    fn test_empty_list_rejected() {
        let mut query = TaskQuery::new();
        let err = query.task_id_in(Vec::<String>::new()).unwrap_err();
        assert!(usage_message(err).contains("taskIdIn must not be empty"));
    }

    #[test]
    fn test_suspension_builders_target_open_disjunct() {
        use crate::query::FieldValue;

        let mut query = TaskQuery::new();
        query.active().unwrap();
        query.or().unwrap().suspended().unwrap().end_or().unwrap();
        assert_eq!(
            query.root().get(F::Suspension),
            Some(&FieldValue::Suspension(SuspensionState::Active))
        );
        assert_eq!(
            query.disjuncts()[0].get(F::Suspension),
            Some(&FieldValue::Suspension(SuspensionState::Suspended))
        );
    }
}
