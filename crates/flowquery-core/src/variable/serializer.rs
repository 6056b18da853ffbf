//! Serializers that project raw values into [`NormalizedValue`] slots.

use crate::error::{QueryError, QueryResult};
use crate::operator::non_queryable;
use flowquery_proto::{NormalizedValue, ValueKind, VariableValue};

/// Writes one value kind into a normalized projection.
pub trait ValueSerializer: Send + Sync {
    /// Type tag recorded on the projection.
    fn type_name(&self) -> &'static str;

    /// Whether values of this serializer can be queried.
    fn is_primitive(&self) -> bool {
        true
    }

    /// Whether this serializer handles the given kind.
    fn handles(&self, kind: ValueKind) -> bool;

    /// Write `value` into the matching slot of `target`.
    fn write_into(&self, value: &VariableValue, target: &mut NormalizedValue) -> QueryResult<()>;
}

/// Looks up the serializer responsible for a value.
pub trait SerializerRegistry: Send + Sync {
    fn find_serializer_for_value(&self, value: &VariableValue) -> QueryResult<&dyn ValueSerializer>;
}

/// Serializer for one primitive kind.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveSerializer {
    kind: ValueKind,
}

impl PrimitiveSerializer {
    pub fn new(kind: ValueKind) -> Self {
        Self { kind }
    }
}

impl ValueSerializer for PrimitiveSerializer {
    fn type_name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn handles(&self, kind: ValueKind) -> bool {
        kind == self.kind
    }

    fn write_into(&self, value: &VariableValue, target: &mut NormalizedValue) -> QueryResult<()> {
        match value {
            VariableValue::Null => {}
            VariableValue::Boolean(b) => target.long = Some(i64::from(*b)),
            VariableValue::String(s) => target.text = Some(s.clone()),
            VariableValue::Short(_)
            | VariableValue::Integer(_)
            | VariableValue::Long(_)
            | VariableValue::Date(_) => target.long = value.as_i64(),
            VariableValue::Double(d) => target.double = Some(*d),
            VariableValue::Bytes(_) | VariableValue::File { .. } | VariableValue::Object { .. } => {
                return Err(non_queryable(value.kind()))
            }
        }
        Ok(())
    }
}

/// Serializer for kinds that are stored but never compared.
#[derive(Debug, Clone, Copy)]
pub struct OpaqueSerializer {
    kind: ValueKind,
}

impl ValueSerializer for OpaqueSerializer {
    fn type_name(&self) -> &'static str {
        self.kind.as_str()
    }

    fn is_primitive(&self) -> bool {
        false
    }

    fn handles(&self, kind: ValueKind) -> bool {
        kind == self.kind
    }

    fn write_into(&self, value: &VariableValue, _target: &mut NormalizedValue) -> QueryResult<()> {
        Err(non_queryable(value.kind()))
    }
}

/// The built-in serializer set covering every [`ValueKind`].
pub struct DefaultSerializers {
    serializers: Vec<Box<dyn ValueSerializer>>,
}

impl DefaultSerializers {
    pub fn new() -> Self {
        let primitives = [
            ValueKind::Null,
            ValueKind::Boolean,
            ValueKind::String,
            ValueKind::Short,
            ValueKind::Integer,
            ValueKind::Long,
            ValueKind::Double,
            ValueKind::Date,
        ];
        let mut serializers: Vec<Box<dyn ValueSerializer>> = primitives
            .into_iter()
            .map(|kind| Box::new(PrimitiveSerializer::new(kind)) as Box<dyn ValueSerializer>)
            .collect();
        for kind in [ValueKind::Bytes, ValueKind::File, ValueKind::Object] {
            serializers.push(Box::new(OpaqueSerializer { kind }));
        }
        Self { serializers }
    }

    /// Register an additional serializer. Later registrations take precedence.
    pub fn register(&mut self, serializer: Box<dyn ValueSerializer>) {
        self.serializers.insert(0, serializer);
    }
}

impl Default for DefaultSerializers {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializerRegistry for DefaultSerializers {
    fn find_serializer_for_value(&self, value: &VariableValue) -> QueryResult<&dyn ValueSerializer> {
        let kind = value.kind();
        self.serializers
            .iter()
            .find(|s| s.handles(kind))
            .map(|s| s.as_ref())
            .ok_or(QueryError::UnknownSerializer(kind))
    }
}
