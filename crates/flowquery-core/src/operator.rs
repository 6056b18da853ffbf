//! Operator legality per value kind.

use crate::error::{QueryError, QueryResult};
use flowquery_proto::{QueryOperator, ValueKind, VariableValue};

/// Whether `operator` may compare a value of this kind.
///
/// Null and boolean values only support equality. Every other primitive
/// kind supports all operators. Non-primitive kinds support none.
pub fn is_legal(operator: QueryOperator, kind: ValueKind) -> bool {
    match kind {
        ValueKind::Null | ValueKind::Boolean => operator.is_equality(),
        other => other.is_primitive(),
    }
}

/// Reject an illegal (operator, value) pair before it is stored.
pub fn check_condition(operator: QueryOperator, value: &VariableValue) -> QueryResult<()> {
    let kind = value.kind();
    if !kind.is_primitive() {
        return Err(non_queryable(kind));
    }
    if !is_legal(operator, kind) {
        return Err(QueryError::usage(format!(
            "Booleans and null cannot be used in '{}' condition",
            operator.description()
        )));
    }
    Ok(())
}

/// The distinct error for binary, file and object values.
pub(crate) fn non_queryable(kind: ValueKind) -> QueryError {
    let reason = match kind {
        ValueKind::Bytes => "Variables of type ByteArray cannot be used to query",
        ValueKind::File => "Variables of type File cannot be used to query",
        _ => "Object values cannot be used to query",
    };
    QueryError::NonQueryableValue {
        kind,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_and_boolean_only_equality() {
        for op in QueryOperator::ALL {
            for value in [VariableValue::Null, VariableValue::Boolean(true), VariableValue::Boolean(false)] {
                let result = check_condition(op, &value);
                if op.is_equality() {
                    assert!(result.is_ok(), "{:?} {:?}", op, value);
                } else {
                    let err = result.unwrap_err();
                    assert!(matches!(err, QueryError::Usage(_)), "{:?}", err);
                }
            }
        }
    }

    #[test]
    fn test_message_names_operator() {
        let err = check_condition(QueryOperator::GreaterThan, &VariableValue::Null).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid query usage: Booleans and null cannot be used in 'greater than' condition"
        );
    }

    #[test]
    fn test_primitives_accept_all_operators() {
        for op in QueryOperator::ALL {
            assert!(is_legal(op, ValueKind::String));
            assert!(is_legal(op, ValueKind::Double));
            assert!(is_legal(op, ValueKind::Date));
        }
    }

    #[test]
    fn test_non_primitive_rejected_with_distinct_error() {
        for op in QueryOperator::ALL {
            let err = check_condition(op, &VariableValue::Bytes(vec![0])).unwrap_err();
            assert!(matches!(err, QueryError::NonQueryableValue { kind: ValueKind::Bytes, .. }));
        }
        let err = check_condition(
            QueryOperator::Equals,
            &VariableValue::Object {
                type_name: "java.util.Map".into(),
                serialized: "{}".into(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Object values cannot be used to query"));
    }
}
