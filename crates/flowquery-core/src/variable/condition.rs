//! A single named, scoped, typed variable comparison.

use crate::config::Dialect;
use crate::error::QueryResult;
use crate::operator::{check_condition, non_queryable};
use crate::variable::serializer::SerializerRegistry;
use flowquery_proto::{NormalizedValue, QueryOperator, VariableScope, VariableValue};
use tracing::trace;

/// One comparison of a runtime variable against a value.
///
/// The raw value is never modified after construction. Normalization
/// derives a fresh [`NormalizedValue`] from it every time it runs.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableCondition {
    pub name: String,
    pub scope: VariableScope,
    pub operator: QueryOperator,
    pub value: VariableValue,
    pub name_ignore_case: bool,
    pub value_ignore_case: bool,
    normalized: Option<NormalizedValue>,
}

impl VariableCondition {
    /// Build a condition, rejecting illegal operator/value pairs.
    pub fn new(
        name: impl Into<String>,
        scope: VariableScope,
        operator: QueryOperator,
        value: VariableValue,
    ) -> QueryResult<Self> {
        check_condition(operator, &value)?;
        Ok(Self {
            name: name.into(),
            scope,
            operator,
            value,
            name_ignore_case: false,
            value_ignore_case: false,
            normalized: None,
        })
    }

    /// The derived projection, once normalized.
    pub fn normalized(&self) -> Option<&NormalizedValue> {
        self.normalized.as_ref()
    }

    /// Same (name, scope) identity.
    pub fn same_identity(&self, other: &VariableCondition) -> bool {
        self.name == other.name && self.scope == other.scope
    }

    /// Whether a stored variable name matches this condition's name.
    pub fn matches_name(&self, name: &str) -> bool {
        if self.name_ignore_case {
            self.name.to_lowercase() == name.to_lowercase()
        } else {
            self.name == name
        }
    }

    /// Project the raw value into its normalized storage form.
    pub fn normalize(&mut self, registry: &dyn SerializerRegistry, dialect: Dialect) -> QueryResult<()> {
        let serializer = registry.find_serializer_for_value(&self.value)?;
        if !serializer.is_primitive() {
            return Err(non_queryable(self.value.kind()));
        }

        let mut normalized = NormalizedValue::new(serializer.type_name());
        serializer.write_into(&self.value, &mut normalized)?;

        if self.value_ignore_case {
            if let Some(text) = normalized.text.as_mut() {
                *text = text.to_lowercase();
            }
        }

        if dialect.stores_empty_string_as_null()
            && self.operator.is_equality()
            && normalized.text.as_deref() == Some("")
        {
            normalized.find_nulled_empty_strings = true;
        }

        trace!(name = %self.name, scope = %self.scope, type_name = %normalized.type_name, "normalized variable condition");
        self.normalized = Some(normalized);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::variable::serializer::DefaultSerializers;

    fn condition(op: QueryOperator, value: impl Into<VariableValue>) -> VariableCondition {
        VariableCondition::new("amount", VariableScope::ProcessInstance, op, value.into()).unwrap()
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let registry = DefaultSerializers::new();
        let mut cond = condition(QueryOperator::GreaterThan, 1500.25);
        cond.normalize(&registry, Dialect::Postgres).unwrap();
        let first = cond.normalized().cloned();
        cond.normalize(&registry, Dialect::Postgres).unwrap();
        assert_eq!(cond.normalized().cloned(), first);
        assert_eq!(cond.value, VariableValue::Double(1500.25));
    }

    #[test]
    fn test_empty_string_flag_only_for_oracle() {
        let registry = DefaultSerializers::new();
        let mut cond = condition(QueryOperator::Equals, "");
        cond.normalize(&registry, Dialect::Oracle).unwrap();
        assert!(cond.normalized().unwrap().find_nulled_empty_strings);

        cond.normalize(&registry, Dialect::Postgres).unwrap();
        assert!(!cond.normalized().unwrap().find_nulled_empty_strings);

        let mut not_equal = condition(QueryOperator::NotEquals, "");
        not_equal.normalize(&registry, Dialect::Oracle).unwrap();
        assert!(not_equal.normalized().unwrap().find_nulled_empty_strings);

        let mut like = condition(QueryOperator::Like, "");
        like.normalize(&registry, Dialect::Oracle).unwrap();
        assert!(!like.normalized().unwrap().find_nulled_empty_strings);
    }

    #[test]
    fn test_value_ignore_case_lowercases_projection_only() {
        let registry = DefaultSerializers::new();
        let mut cond = condition(QueryOperator::Equals, "Approved");
        cond.value_ignore_case = true;
        cond.normalize(&registry, Dialect::H2).unwrap();
        assert_eq!(cond.normalized().unwrap().text.as_deref(), Some("approved"));
        assert_eq!(cond.value, VariableValue::from("Approved"));
    }

    #[test]
    fn test_illegal_condition_not_constructed() {
        let err = VariableCondition::new(
            "flag",
            VariableScope::TaskLocal,
            QueryOperator::LessThan,
            VariableValue::Boolean(true),
        )
        .unwrap_err();
        assert!(matches!(err, QueryError::Usage(_)));
    }

    #[test]
    fn test_name_matching() {
        let mut cond = condition(QueryOperator::Equals, 1i64);
        assert!(cond.matches_name("amount"));
        assert!(!cond.matches_name("AMOUNT"));
        cond.name_ignore_case = true;
        assert!(cond.matches_name("AMOUNT"));
    }
}
