//! Normalized storage projection of a variable condition's value.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// The storage-comparable projection of a raw comparison value.
///
/// A serializer fills at most one of the value slots and records its type
/// name. Executors compare against the slot that is set.
#[derive(
    Debug, Clone, Default, PartialEq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize,
)]
pub struct NormalizedValue {
    /// Name of the serializer that produced this projection.
    pub type_name: String,
    pub text: Option<String>,
    pub text2: Option<String>,
    pub long: Option<i64>,
    pub double: Option<f64>,
    /// Set when the backend stores empty strings as NULL and an equality
    /// comparison against `""` must also match NULL text.
    pub find_nulled_empty_strings: bool,
}

impl NormalizedValue {
    /// Empty projection tagged with a serializer type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    /// True if no value slot is set (the null projection).
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.text2.is_none() && self.long.is_none() && self.double.is_none()
    }
}
