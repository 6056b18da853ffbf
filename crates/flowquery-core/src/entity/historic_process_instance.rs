//! Historic process instance queries.

use crate::error::QueryResult;
use crate::query::entity::{EntityKind, ExcludedWhen, MembershipCheck, RangeCheck};
use crate::query::field::{ExclusionRule, FieldDescriptor, FieldTest};
use crate::query::Query;
use chrono::{DateTime, Utc};
use flowquery_proto::{OrderDirection, VariableScope};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoricProcessInstance;

pub type HistoricProcessInstanceQuery = Query<HistoricProcessInstance>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HistoricProcessInstanceField {
    ProcessInstanceId,
    ProcessInstanceIds,
    BusinessKey,
    BusinessKeyLike,
    ProcessDefinitionId,
    ProcessDefinitionKey,
    ProcessDefinitionKeyNotIn,
    ProcessDefinitionName,
    ProcessDefinitionNameLike,
    StartedBy,
    StartedAfter,
    StartedBefore,
    FinishedAfter,
    FinishedBefore,
    Finished,
    Unfinished,
    SuperProcessInstanceId,
    SubProcessInstanceId,
    SuperCaseInstanceId,
    RootProcessInstances,
    CaseInstanceId,
    State,
    WithIncidents,
    TenantIds,
    WithoutTenantId,
}

use HistoricProcessInstanceField as F;

static FIELDS: &[FieldDescriptor<HistoricProcessInstanceField>] = &[
    FieldDescriptor::text(F::ProcessInstanceId, "processInstanceId", FieldTest::Equals("id")),
    FieldDescriptor::list(F::ProcessInstanceIds, "processInstanceIds", FieldTest::In("id")),
    FieldDescriptor::text(F::BusinessKey, "processInstanceBusinessKey", FieldTest::Equals("businessKey")),
    FieldDescriptor::text(F::BusinessKeyLike, "processInstanceBusinessKeyLike", FieldTest::Like("businessKey")),
    FieldDescriptor::text(F::ProcessDefinitionId, "processDefinitionId", FieldTest::Equals("processDefinitionId")),
    FieldDescriptor::text(F::ProcessDefinitionKey, "processDefinitionKey", FieldTest::Equals("processDefinitionKey")),
    FieldDescriptor::list(
        F::ProcessDefinitionKeyNotIn,
        "processDefinitionKeyNotIn",
        FieldTest::NotIn("processDefinitionKey"),
    ),
    FieldDescriptor::text(F::ProcessDefinitionName, "processDefinitionName", FieldTest::Equals("processDefinitionName")),
    FieldDescriptor::text(
        F::ProcessDefinitionNameLike,
        "processDefinitionNameLike",
        FieldTest::Like("processDefinitionName"),
    ),
    FieldDescriptor::text(F::StartedBy, "startedBy", FieldTest::Equals("startUserId")),
    FieldDescriptor::timestamp(F::StartedAfter, "startedAfter", FieldTest::GreaterThan("startTime")),
    FieldDescriptor::timestamp(F::StartedBefore, "startedBefore", FieldTest::LessThan("startTime")),
    FieldDescriptor::timestamp(F::FinishedAfter, "finishedAfter", FieldTest::GreaterThan("endTime")),
    FieldDescriptor::timestamp(F::FinishedBefore, "finishedBefore", FieldTest::LessThan("endTime")),
    FieldDescriptor::flag(F::Finished, "finished", FieldTest::Present("endTime")),
    FieldDescriptor::flag(F::Unfinished, "unfinished", FieldTest::Absent("endTime")),
    FieldDescriptor::text(
        F::SuperProcessInstanceId,
        "superProcessInstanceId",
        FieldTest::Equals("superProcessInstanceId"),
    ),
    FieldDescriptor::text(F::SubProcessInstanceId, "subProcessInstanceId", FieldTest::Equals("subProcessInstanceId")),
    FieldDescriptor::text(F::SuperCaseInstanceId, "superCaseInstanceId", FieldTest::Equals("superCaseInstanceId")),
    FieldDescriptor::flag(F::RootProcessInstances, "rootProcessInstances", FieldTest::Absent("superProcessInstanceId")),
    FieldDescriptor::text(F::CaseInstanceId, "caseInstanceId", FieldTest::Equals("caseInstanceId")),
    FieldDescriptor::text(F::State, "state", FieldTest::Equals("state")),
    FieldDescriptor::flag(F::WithIncidents, "withIncidents", FieldTest::Present("incidentId")),
    FieldDescriptor::list(F::TenantIds, "tenantIdIn", FieldTest::In("tenantId")),
    FieldDescriptor::flag(F::WithoutTenantId, "withoutTenantId", FieldTest::Absent("tenantId")),
];

static EXCLUSIONS: &[ExclusionRule<HistoricProcessInstanceField>] = &[
    ExclusionRule::always(F::RootProcessInstances, F::SuperProcessInstanceId),
    ExclusionRule::always(F::RootProcessInstances, F::SuperCaseInstanceId),
    ExclusionRule::conjunction_only(F::Finished, F::Unfinished),
    ExclusionRule::conjunction_only(F::TenantIds, F::WithoutTenantId),
];

static RANGES: &[RangeCheck<HistoricProcessInstanceField>] = &[
    RangeCheck { fields: &[F::StartedAfter, F::StartedBefore] },
    RangeCheck { fields: &[F::FinishedAfter, F::FinishedBefore] },
];

static MEMBERSHIPS: &[MembershipCheck<HistoricProcessInstanceField>] = &[
    MembershipCheck {
        element: F::ProcessDefinitionKey,
        set: F::ProcessDefinitionKeyNotIn,
        excluded_when: ExcludedWhen::ElementFoundIn,
    },
    MembershipCheck {
        element: F::ProcessInstanceId,
        set: F::ProcessInstanceIds,
        excluded_when: ExcludedWhen::ElementMissingFrom,
    },
];

impl EntityKind for HistoricProcessInstance {
    const NAME: &'static str = "HistoricProcessInstance";

    type Field = HistoricProcessInstanceField;

    fn descriptors() -> &'static [FieldDescriptor<HistoricProcessInstanceField>] {
        FIELDS
    }

    fn exclusions() -> &'static [ExclusionRule<HistoricProcessInstanceField>] {
        EXCLUSIONS
    }

    fn range_checks() -> &'static [RangeCheck<HistoricProcessInstanceField>] {
        RANGES
    }

    fn membership_checks() -> &'static [MembershipCheck<HistoricProcessInstanceField>] {
        MEMBERSHIPS
    }

    fn variable_scopes() -> &'static [VariableScope] {
        &[VariableScope::ProcessInstance]
    }

    fn sort_keys() -> &'static [&'static str] {
        &[
            "id",
            "businessKey",
            "startTime",
            "endTime",
            "duration",
            "processDefinitionId",
            "processDefinitionKey",
            "processDefinitionName",
            "tenantId",
        ]
    }
}

impl Query<HistoricProcessInstance> {
    pub fn process_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessInstanceId, id)
    }

    pub fn process_instance_ids<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, ids: I) -> QueryResult<&mut Self> {
        self.set_list(F::ProcessInstanceIds, ids)
    }

    pub fn process_instance_business_key(&mut self, key: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::BusinessKey, key)
    }

    pub fn process_instance_business_key_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::BusinessKeyLike, pattern)
    }

    pub fn process_definition_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessDefinitionId, id)
    }

    pub fn process_definition_key(&mut self, key: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessDefinitionKey, key)
    }

    pub fn process_definition_key_not_in<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        keys: I,
    ) -> QueryResult<&mut Self> {
        self.set_list(F::ProcessDefinitionKeyNotIn, keys)
    }

    pub fn process_definition_name(&mut self, name: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessDefinitionName, name)
    }

    pub fn process_definition_name_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::ProcessDefinitionNameLike, pattern)
    }

    pub fn started_by(&mut self, user: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::StartedBy, user)
    }

    pub fn started_after(&mut self, date: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::StartedAfter, date)
    }

    pub fn started_before(&mut self, date: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::StartedBefore, date)
    }

    pub fn finished_after(&mut self, date: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::FinishedAfter, date)
    }

    pub fn finished_before(&mut self, date: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set_timestamp(F::FinishedBefore, date)
    }

    pub fn finished(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::Finished)
    }

    pub fn unfinished(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::Unfinished)
    }

    pub fn super_process_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::SuperProcessInstanceId, id)
    }

    pub fn sub_process_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::SubProcessInstanceId, id)
    }

    pub fn super_case_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::SuperCaseInstanceId, id)
    }

    pub fn root_process_instances(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::RootProcessInstances)
    }

    pub fn case_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::CaseInstanceId, id)
    }

    /// Filter by lifecycle state, e.g. `ACTIVE` or `COMPLETED`.
    pub fn state(&mut self, state: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::State, state)
    }

    pub fn with_incidents(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithIncidents)
    }

    pub fn tenant_id_in<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, tenants: I) -> QueryResult<&mut Self> {
        self.set_list(F::TenantIds, tenants)
    }

    pub fn without_tenant_id(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithoutTenantId)
    }

    variable_filters!(
        VariableScope::ProcessInstance,
        variable_value,
        variable_value_equals,
        variable_value_not_equals,
        variable_value_greater_than,
        variable_value_greater_than_or_equal,
        variable_value_less_than,
        variable_value_less_than_or_equal,
        variable_value_like,
        variable_value_not_like
    );

    pub fn order_by_process_instance_id(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("id", direction)
    }

    pub fn order_by_process_instance_business_key(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("businessKey", direction)
    }

    pub fn order_by_process_instance_start_time(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("startTime", direction)
    }

    pub fn order_by_process_instance_end_time(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("endTime", direction)
    }

    pub fn order_by_process_instance_duration(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("duration", direction)
    }

    pub fn order_by_process_definition_key(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("processDefinitionKey", direction)
    }

    pub fn order_by_tenant_id(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("tenantId", direction)
    }
}
