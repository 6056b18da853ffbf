//! The entity abstraction every query surface is built on.

use crate::query::field::{ExclusionRule, FieldDescriptor};
use flowquery_proto::VariableScope;
use std::fmt;
use std::hash::Hash;

/// Values that must be non-decreasing, ignoring unset ones.
///
/// `[dueAfter, dueDate, dueBefore]` is the typical shape: a due date
/// outside the window, or a window that closes before it opens, can never
/// match.
#[derive(Debug, Clone, Copy)]
pub struct RangeCheck<F: 'static> {
    pub fields: &'static [F],
}

/// Which membership relation makes a query unsatisfiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludedWhen {
    /// The element is not contained in the set.
    ElementMissingFrom,
    /// The element is contained in the set.
    ElementFoundIn,
    /// Every element of a list is contained in the set.
    AllFoundIn,
}

/// An element/set pair checked for an unsatisfiable membership.
#[derive(Debug, Clone, Copy)]
pub struct MembershipCheck<F: 'static> {
    pub element: F,
    pub set: F,
    pub excluded_when: ExcludedWhen,
}

/// Fields feeding the candidate-group resolver.
#[derive(Debug, Clone, Copy)]
pub struct CandidateFields<F: 'static> {
    pub user: F,
    pub group: F,
    pub groups: F,
    /// Widens candidate matching to tasks that already have an assignee.
    pub include_assigned: F,
    /// Record column holding the assignee.
    pub assignee_column: &'static str,
}

impl<F: Copy + PartialEq> CandidateFields<F> {
    /// Whether `field` changes the resolved candidate groups.
    pub fn contributes(&self, field: F) -> bool {
        field == self.user || field == self.group || field == self.groups
    }
}

/// A queryable entity: its field enum and the static rule tables.
pub trait EntityKind: fmt::Debug + Clone + Copy + Default + PartialEq + Send + Sync + 'static {
    /// Resource type name, e.g. `"Task"`.
    const NAME: &'static str;

    type Field: Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static;

    /// Scalar filters, in the order they are merged and serialized.
    fn descriptors() -> &'static [FieldDescriptor<Self::Field>];

    fn exclusions() -> &'static [ExclusionRule<Self::Field>] {
        &[]
    }

    fn range_checks() -> &'static [RangeCheck<Self::Field>] {
        &[]
    }

    fn membership_checks() -> &'static [MembershipCheck<Self::Field>] {
        &[]
    }

    /// Variable scopes conditions may target.
    fn variable_scopes() -> &'static [VariableScope];

    /// Property names accepted by `order_by`.
    fn sort_keys() -> &'static [&'static str];

    fn candidate_fields() -> Option<CandidateFields<Self::Field>> {
        None
    }

    fn descriptor(field: Self::Field) -> Option<&'static FieldDescriptor<Self::Field>> {
        Self::descriptors().iter().find(|d| d.field == field)
    }

    fn descriptor_by_key(key: &str) -> Option<&'static FieldDescriptor<Self::Field>> {
        Self::descriptors().iter().find(|d| d.key == key)
    }
}
