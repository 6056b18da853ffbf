//! One node of a query: the root conjunction or one `or()` group.

use crate::query::entity::EntityKind;
use crate::query::field::FieldValue;
use crate::security::candidate::GroupSet;
use crate::variable::VariableCondition;
use flowquery_proto::{OrderDirection, ValueKind, VariableScope};
use std::collections::BTreeMap;

/// What an ordering directive sorts by.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderTarget {
    /// A sort key from the entity's sort key table.
    Property(&'static str),
    /// The value of a variable, compared as the given kind.
    Variable {
        name: String,
        scope: VariableScope,
        kind: ValueKind,
    },
}

/// One ordering directive.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderingProperty {
    pub target: OrderTarget,
    pub direction: OrderDirection,
}

/// Filters attached to one target of a query.
///
/// On the root every filter must hold. Inside an `or()` group at least one
/// of them must hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate<E: EntityKind> {
    fields: BTreeMap<E::Field, FieldValue>,
    variables: Vec<VariableCondition>,
    ordering: Vec<OrderingProperty>,
    disjunct: bool,
    /// `None` until resolved; `Some(None)` when no group filter applies.
    candidate_cache: Option<Option<GroupSet>>,
}

impl<E: EntityKind> Predicate<E> {
    pub(crate) fn new(disjunct: bool) -> Self {
        Self {
            fields: BTreeMap::new(),
            variables: Vec::new(),
            ordering: Vec::new(),
            disjunct,
            candidate_cache: None,
        }
    }

    /// True for `or()` groups.
    pub fn is_disjunct(&self) -> bool {
        self.disjunct
    }

    pub fn get(&self, field: E::Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn is_set(&self, field: E::Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn text(&self, field: E::Field) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn list(&self, field: E::Field) -> Option<&[String]> {
        self.get(field).and_then(FieldValue::as_list)
    }

    /// Set fields in field order.
    pub fn fields(&self) -> impl Iterator<Item = (E::Field, &FieldValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    pub fn variables(&self) -> &[VariableCondition] {
        &self.variables
    }

    pub fn ordering(&self) -> &[OrderingProperty] {
        &self.ordering
    }

    /// No field and no variable condition set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.variables.is_empty()
    }

    /// Resolved candidate groups.
    ///
    /// `None` when the predicate carries no group constraint or has not been
    /// prepared yet.
    pub fn candidate_groups(&self) -> Option<&GroupSet> {
        self.candidate_cache.as_ref().and_then(Option::as_ref)
    }

    pub(crate) fn insert(&mut self, field: E::Field, value: FieldValue) {
        self.fields.insert(field, value);
    }

    pub(crate) fn push_variable(&mut self, condition: VariableCondition) {
        self.variables.push(condition);
    }

    pub(crate) fn variables_mut(&mut self) -> &mut [VariableCondition] {
        &mut self.variables
    }

    pub(crate) fn push_ordering(&mut self, property: OrderingProperty) {
        self.ordering.push(property);
    }

    pub(crate) fn is_candidate_resolved(&self) -> bool {
        self.candidate_cache.is_some()
    }

    pub(crate) fn store_candidate_groups(&mut self, groups: Option<GroupSet>) {
        self.candidate_cache = Some(groups);
    }

    pub(crate) fn invalidate_candidate_groups(&mut self) {
        self.candidate_cache = None;
    }

    /// Copy of this predicate re-targeted as an `or()` group.
    pub(crate) fn as_disjunct(&self) -> Self {
        let mut copy = self.clone();
        copy.disjunct = true;
        copy.candidate_cache = None;
        copy
    }
}
