//! Comparison operators and variable scopes.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Comparison operator of a variable condition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
}

impl QueryOperator {
    /// All operators, in declaration order.
    pub const ALL: [QueryOperator; 8] = [
        QueryOperator::Equals,
        QueryOperator::NotEquals,
        QueryOperator::GreaterThan,
        QueryOperator::GreaterThanOrEqual,
        QueryOperator::LessThan,
        QueryOperator::LessThanOrEqual,
        QueryOperator::Like,
        QueryOperator::NotLike,
    ];

    /// EQUALS and NOT_EQUALS.
    pub fn is_equality(self) -> bool {
        matches!(self, QueryOperator::Equals | QueryOperator::NotEquals)
    }

    /// Upper snake case name, as stored in saved filters.
    pub fn as_str(self) -> &'static str {
        match self {
            QueryOperator::Equals => "EQUALS",
            QueryOperator::NotEquals => "NOT_EQUALS",
            QueryOperator::GreaterThan => "GREATER_THAN",
            QueryOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            QueryOperator::LessThan => "LESS_THAN",
            QueryOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            QueryOperator::Like => "LIKE",
            QueryOperator::NotLike => "NOT_LIKE",
        }
    }

    /// Human readable form used in error messages.
    pub fn description(self) -> &'static str {
        match self {
            QueryOperator::Equals => "equals",
            QueryOperator::NotEquals => "not equals",
            QueryOperator::GreaterThan => "greater than",
            QueryOperator::GreaterThanOrEqual => "greater than or equal",
            QueryOperator::LessThan => "less than",
            QueryOperator::LessThanOrEqual => "less than or equal",
            QueryOperator::Like => "like",
            QueryOperator::NotLike => "not like",
        }
    }
}

impl std::fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QueryOperator {
    type Err = crate::Error;

    /// Accepts the upper snake case names as well as the short REST forms
    /// (`eq`, `neq`, `gt`, `gteq`, `lt`, `lteq`, `like`, `notLike`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "EQUALS" | "eq" => QueryOperator::Equals,
            "NOT_EQUALS" | "neq" => QueryOperator::NotEquals,
            "GREATER_THAN" | "gt" => QueryOperator::GreaterThan,
            "GREATER_THAN_OR_EQUAL" | "gteq" => QueryOperator::GreaterThanOrEqual,
            "LESS_THAN" | "lt" => QueryOperator::LessThan,
            "LESS_THAN_OR_EQUAL" | "lteq" => QueryOperator::LessThanOrEqual,
            "LIKE" | "like" => QueryOperator::Like,
            "NOT_LIKE" | "notLike" => QueryOperator::NotLike,
            _ => {
                return Err(crate::Error::UnknownName {
                    kind: "operator",
                    value: s.to_string(),
                })
            }
        };
        Ok(op)
    }
}

/// Storage a variable name resolves against.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum VariableScope {
    /// Variables local to the task itself.
    TaskLocal,
    /// Variables of the owning process instance.
    ProcessInstance,
    /// Variables of the owning case instance.
    CaseInstance,
}

impl VariableScope {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableScope::TaskLocal => "taskLocal",
            VariableScope::ProcessInstance => "processInstance",
            VariableScope::CaseInstance => "caseInstance",
        }
    }
}

impl std::fmt::Display for VariableScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VariableScope {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "taskLocal" | "task" => Ok(VariableScope::TaskLocal),
            "processInstance" | "process" => Ok(VariableScope::ProcessInstance),
            "caseInstance" | "case" => Ok(VariableScope::CaseInstance),
            _ => Err(crate::Error::UnknownName {
                kind: "variable scope",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_names() {
        for op in QueryOperator::ALL {
            assert_eq!(op.as_str().parse::<QueryOperator>().unwrap(), op);
        }
        assert_eq!("gteq".parse::<QueryOperator>().unwrap(), QueryOperator::GreaterThanOrEqual);
        let err = "between".parse::<QueryOperator>().unwrap_err();
        assert!(matches!(err, crate::Error::UnknownName { kind: "operator", .. }));
        assert_eq!(err.to_string(), "unknown operator: between");
    }

    #[test]
    fn test_operator_serde_name() {
        let json = serde_json::to_string(&QueryOperator::NotLike).unwrap();
        assert_eq!(json, "\"NOT_LIKE\"");
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("process".parse::<VariableScope>().unwrap(), VariableScope::ProcessInstance);
        assert_eq!(VariableScope::CaseInstance.to_string(), "caseInstance");
    }
}
