//! Variable conditions and their normalization.

pub mod condition;
pub mod serializer;

pub use condition::VariableCondition;
pub use serializer::{DefaultSerializers, SerializerRegistry, ValueSerializer};
