//! Runtime process instance queries.

use crate::error::QueryResult;
use crate::query::field::{ExclusionRule, FieldDescriptor, FieldTest, SuspensionState};
use crate::query::Query;
use flowquery_proto::{OrderDirection, VariableScope};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessInstance;

pub type ProcessInstanceQuery = Query<ProcessInstance>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessInstanceField {
    ProcessInstanceId,
    ProcessInstanceIds,
    BusinessKey,
    BusinessKeyLike,
    ProcessDefinitionId,
    ProcessDefinitionKey,
    ProcessDefinitionKeyIn,
    ProcessDefinitionKeyNotIn,
    DeploymentId,
    SuperProcessInstanceId,
    SubProcessInstanceId,
    RootProcessInstances,
    LeafProcessInstances,
    CaseInstanceId,
    SuperCaseInstanceId,
    Suspension,
    WithIncident,
    IncidentId,
    IncidentType,
    IncidentMessage,
    IncidentMessageLike,
    ActivityIds,
    TenantIds,
    WithoutTenantId,
}

use ProcessInstanceField as F;

static FIELDS: &[FieldDescriptor<ProcessInstanceField>] = &[
    FieldDescriptor::text(F::ProcessInstanceId, "processInstanceId", FieldTest::Equals("id")),
    FieldDescriptor::list(F::ProcessInstanceIds, "processInstanceIds", FieldTest::In("id")),
    FieldDescriptor::text(F::BusinessKey, "businessKey", FieldTest::Equals("businessKey")),
    FieldDescriptor::text(F::BusinessKeyLike, "businessKeyLike", FieldTest::Like("businessKey")),
    FieldDescriptor::text(F::ProcessDefinitionId, "processDefinitionId", FieldTest::Equals("processDefinitionId")),
    FieldDescriptor::text(F::ProcessDefinitionKey, "processDefinitionKey", FieldTest::Equals("processDefinitionKey")),
    FieldDescriptor::list(F::ProcessDefinitionKeyIn, "processDefinitionKeyIn", FieldTest::In("processDefinitionKey")),
    FieldDescriptor::list(
        F::ProcessDefinitionKeyNotIn,
        "processDefinitionKeyNotIn",
        FieldTest::NotIn("processDefinitionKey"),
    ),
    FieldDescriptor::text(F::DeploymentId, "deploymentId", FieldTest::Equals("deploymentId")),
    FieldDescriptor::text(
        F::SuperProcessInstanceId,
        "superProcessInstanceId",
        FieldTest::Equals("superProcessInstanceId"),
    ),
    FieldDescriptor::text(F::SubProcessInstanceId, "subProcessInstanceId", FieldTest::Equals("subProcessInstanceId")),
    FieldDescriptor::flag(F::RootProcessInstances, "rootProcessInstances", FieldTest::Absent("superProcessInstanceId")),
    FieldDescriptor::flag(F::LeafProcessInstances, "leafProcessInstances", FieldTest::Absent("subProcessInstanceId")),
    FieldDescriptor::text(F::CaseInstanceId, "caseInstanceId", FieldTest::Equals("caseInstanceId")),
    FieldDescriptor::text(F::SuperCaseInstanceId, "superCaseInstanceId", FieldTest::Equals("superCaseInstanceId")),
    FieldDescriptor::suspension(F::Suspension, "suspensionState", "suspended"),
    FieldDescriptor::flag(F::WithIncident, "withIncident", FieldTest::Present("incidentId")),
    FieldDescriptor::text(F::IncidentId, "incidentId", FieldTest::Equals("incidentId")),
    FieldDescriptor::text(F::IncidentType, "incidentType", FieldTest::Equals("incidentType")),
    FieldDescriptor::text(F::IncidentMessage, "incidentMessage", FieldTest::Equals("incidentMessage")),
    FieldDescriptor::text(F::IncidentMessageLike, "incidentMessageLike", FieldTest::Like("incidentMessage")),
    FieldDescriptor::list(F::ActivityIds, "activityIdIn", FieldTest::In("activityId")),
    FieldDescriptor::list(F::TenantIds, "tenantIdIn", FieldTest::In("tenantId")),
    FieldDescriptor::flag(F::WithoutTenantId, "withoutTenantId", FieldTest::Absent("tenantId")),
];

static EXCLUSIONS: &[ExclusionRule<ProcessInstanceField>] = &[
    ExclusionRule::always(F::RootProcessInstances, F::SuperProcessInstanceId),
    ExclusionRule::always(F::LeafProcessInstances, F::SubProcessInstanceId),
    ExclusionRule::conjunction_only(F::TenantIds, F::WithoutTenantId),
];

impl crate::query::EntityKind for ProcessInstance {
    const NAME: &'static str = "ProcessInstance";

    type Field = ProcessInstanceField;

    fn descriptors() -> &'static [FieldDescriptor<ProcessInstanceField>] {
        FIELDS
    }

    fn exclusions() -> &'static [ExclusionRule<ProcessInstanceField>] {
        EXCLUSIONS
    }

    fn variable_scopes() -> &'static [VariableScope] {
        &[VariableScope::ProcessInstance]
    }

    fn sort_keys() -> &'static [&'static str] {
        &["id", "businessKey", "processDefinitionId", "processDefinitionKey", "tenantId"]
    }
}

impl Query<ProcessInstance> {
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

    pub fn process_definition_key_in<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        keys: I,
    ) -> QueryResult<&mut Self> {
        self.set_list(F::ProcessDefinitionKeyIn, keys)
    }

    pub fn process_definition_key_not_in<I: IntoIterator<Item = S>, S: Into<String>>(
        &mut self,
        keys: I,
    ) -> QueryResult<&mut Self> {
        self.set_list(F::ProcessDefinitionKeyNotIn, keys)
    }

    pub fn deployment_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::DeploymentId, id)
    }

    pub fn super_process_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::SuperProcessInstanceId, id)
    }

    pub fn sub_process_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::SubProcessInstanceId, id)
    }

    /// Instances without a parent process instance.
    pub fn root_process_instances(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::RootProcessInstances)
    }

    /// Instances that do not call a sub process.
    pub fn leaf_process_instances(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::LeafProcessInstances)
    }

    pub fn case_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::CaseInstanceId, id)
    }

    pub fn super_case_instance_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::SuperCaseInstanceId, id)
    }

    pub fn active(&mut self) -> QueryResult<&mut Self> {
        self.set_suspension(F::Suspension, SuspensionState::Active)
    }

    pub fn suspended(&mut self) -> QueryResult<&mut Self> {
        self.set_suspension(F::Suspension, SuspensionState::Suspended)
    }

    pub fn with_incident(&mut self) -> QueryResult<&mut Self> {
        self.set_flag(F::WithIncident)
    }

    pub fn incident_id(&mut self, id: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::IncidentId, id)
    }

    pub fn incident_type(&mut self, kind: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::IncidentType, kind)
    }

    pub fn incident_message(&mut self, message: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::IncidentMessage, message)
    }

    pub fn incident_message_like(&mut self, pattern: impl Into<String>) -> QueryResult<&mut Self> {
        self.set_text(F::IncidentMessageLike, pattern)
    }

    pub fn activity_id_in<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, ids: I) -> QueryResult<&mut Self> {
        self.set_list(F::ActivityIds, ids)
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

    pub fn order_by_business_key(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("businessKey", direction)
    }

    pub fn order_by_process_definition_key(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("processDefinitionKey", direction)
    }

    pub fn order_by_tenant_id(&mut self, direction: OrderDirection) -> QueryResult<&mut Self> {
        self.order_by("tenantId", direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_and_super_instance_exclusive() {
        let mut query = ProcessInstanceQuery::new();
        query.super_process_instance_id("pi-1").unwrap();
        let err = query.root_process_instances().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid query usage: cannot set both rootProcessInstances and superProcessInstanceId"
        );
    }

    #[test]
    fn test_leaf_exclusion_holds_inside_or() {
        let mut query = ProcessInstanceQuery::new();
        query.or().unwrap().leaf_process_instances().unwrap();
        assert!(query.sub_process_instance_id("pi-2").is_err());

        // the root is a different target
        query.end_or().unwrap();
        assert!(query.sub_process_instance_id("pi-2").is_ok());
    }

    #[test]
    fn test_only_process_variables() {
        let mut query = ProcessInstanceQuery::new();
        query.variable_value_equals("orderId", 7i64).unwrap();
        let err = query
            .add_variable("x", VariableScope::TaskLocal, crate::QueryOperator::Equals, 1i64)
            .unwrap_err();
        assert!(err.is_usage_error());
        assert_eq!(query.root().variables().len(), 1);
    }

    #[test]
    fn test_unknown_sort_key() {
        let mut query = ProcessInstanceQuery::new();
        assert!(query.order_by("due", OrderDirection::Asc).is_err());
        query.order_by_business_key(OrderDirection::Desc).unwrap();
        assert_eq!(query.root().ordering().len(), 1);
    }
}
