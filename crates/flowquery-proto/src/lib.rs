//! flowquery protocol types.
//!
//! The data types that cross the boundary between the query composer and
//! whatever executes a finished query: variable values, comparison
//! operators, variable scopes and normalized value projections.
//!
//! # Modules
//!
//! - [`value`] - Runtime variable values and their closed kinds
//! - [`operator`] - Comparison operators and variable scopes
//! - [`normalized`] - Storage projection of a comparison value
//! - [`order`] - Sort direction
//! - [`error`] - Protocol error types
//!
//! # Serialization
//!
//! All types derive `rkyv::Archive`, `rkyv::Serialize` and
//! `rkyv::Deserialize` for zero-copy hand-off to an executor, and serde
//! traits for saved-filter persistence.

pub mod error;
pub mod normalized;
pub mod operator;
pub mod order;
pub mod value;

pub use error::Error;

// Re-export commonly used types at crate root
pub use normalized::NormalizedValue;
pub use operator::{QueryOperator, VariableScope};
pub use order::OrderDirection;
pub use value::{ValueKind, VariableValue};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_roundtrip() {
        let value = VariableValue::File {
            name: "invoice.pdf".into(),
            mime_type: Some("application/pdf".into()),
            content: vec![1, 2, 3],
        };
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&value).unwrap();
        let archived =
            rkyv::access::<value::ArchivedVariableValue, rkyv::rancor::Error>(&bytes).unwrap();
        let deserialized: VariableValue =
            rkyv::deserialize::<VariableValue, rkyv::rancor::Error>(archived).unwrap();
        assert_eq!(value, deserialized);
    }

    #[test]
    fn test_normalized_roundtrip() {
        let mut normalized = NormalizedValue::new("string");
        normalized.text = Some(String::new());
        normalized.find_nulled_empty_strings = true;

        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&normalized).unwrap();
        let archived =
            rkyv::access::<normalized::ArchivedNormalizedValue, rkyv::rancor::Error>(&bytes)
                .unwrap();
        assert!(archived.find_nulled_empty_strings);
        let deserialized: NormalizedValue =
            rkyv::deserialize::<NormalizedValue, rkyv::rancor::Error>(archived).unwrap();
        assert_eq!(normalized, deserialized);
    }

    #[test]
    fn test_value_serde_shape() {
        let json = serde_json::to_value(VariableValue::Long(5)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Long", "value": 5}));
        let back: VariableValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, VariableValue::Long(5));
    }
}
