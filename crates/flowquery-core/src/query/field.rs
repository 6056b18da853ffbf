//! Scalar filter values and the per-field descriptor tables.
//!
//! Every entity describes its scalar filters with a static table of
//! [`FieldDescriptor`]s. The composer, the merge engine, the saved-filter
//! converter and the in-memory executor all read the same table, so the
//! rules for one field live in exactly one place.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Shape of the value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Text,
    Integer,
    Timestamp,
    TextList,
    Flag,
    Suspension,
}

impl FieldShape {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldShape::Text => "text",
            FieldShape::Integer => "integer",
            FieldShape::Timestamp => "timestamp",
            FieldShape::TextList => "text list",
            FieldShape::Flag => "flag",
            FieldShape::Suspension => "suspension state",
        }
    }
}

/// Active or suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspensionState {
    Active,
    Suspended,
}

/// Value held by one scalar filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
    TextList(Vec<String>),
    Flag,
    Suspension(SuspensionState),
}

impl FieldValue {
    pub fn shape(&self) -> FieldShape {
        match self {
            FieldValue::Text(_) => FieldShape::Text,
            FieldValue::Integer(_) => FieldShape::Integer,
            FieldValue::Timestamp(_) => FieldShape::Timestamp,
            FieldValue::TextList(_) => FieldShape::TextList,
            FieldValue::Flag => FieldShape::Flag,
            FieldValue::Suspension(_) => FieldShape::Suspension,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::TextList(items) => Some(items),
            _ => None,
        }
    }

    /// Order two values of the same comparable shape.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// How [`crate::query::Query::extend`] combines a field present on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeRule {
    /// Scalar: the extension's value if set, else the base's.
    Override,
    /// Collection: the extension's list replaces the base's outright. Never unioned.
    Replace,
    /// Flag: set if set on either side.
    Union,
}

/// How an executor evaluates a field against a stored record.
///
/// Column names refer to the record's column map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldTest {
    Equals(&'static str),
    NotEquals(&'static str),
    Like(&'static str),
    In(&'static str),
    NotIn(&'static str),
    GreaterThan(&'static str),
    LessThan(&'static str),
    AtLeast(&'static str),
    AtMost(&'static str),
    Present(&'static str),
    Absent(&'static str),
    /// Boolean `suspended` column compared with a suspension state.
    Suspension(&'static str),
    /// Part of the candidate user/group resolution.
    Candidate,
    /// Any candidate group of the record matches a LIKE pattern.
    CandidateGroupLike,
    HasCandidateGroups,
    NoCandidateGroups,
    HasCandidateUsers,
    NoCandidateUsers,
    /// Alters how results are produced, never filters records.
    Modifier,
}

impl FieldTest {
    /// Record column the test reads, if it reads exactly one.
    pub fn column(self) -> Option<&'static str> {
        match self {
            FieldTest::Equals(col)
            | FieldTest::NotEquals(col)
            | FieldTest::Like(col)
            | FieldTest::In(col)
            | FieldTest::NotIn(col)
            | FieldTest::GreaterThan(col)
            | FieldTest::LessThan(col)
            | FieldTest::AtLeast(col)
            | FieldTest::AtMost(col)
            | FieldTest::Present(col)
            | FieldTest::Absent(col)
            | FieldTest::Suspension(col) => Some(col),
            _ => None,
        }
    }
}

/// Static description of one scalar filter.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor<F: 'static> {
    pub field: F,
    /// Stable camelCase name, used in messages and saved filters.
    pub key: &'static str,
    pub shape: FieldShape,
    pub merge: MergeRule,
    pub test: FieldTest,
    /// Whether the field may be set inside an `or()` group.
    pub in_disjunct: bool,
    /// At least one of these must already be set on the same target.
    pub requires_any: &'static [F],
    /// Flag that makes records without the tested column match as well.
    pub null_accepted_by: Option<F>,
}

impl<F: Copy> FieldDescriptor<F> {
    const fn with(field: F, key: &'static str, shape: FieldShape, merge: MergeRule, test: FieldTest) -> Self {
        Self {
            field,
            key,
            shape,
            merge,
            test,
            in_disjunct: true,
            requires_any: &[],
            null_accepted_by: None,
        }
    }

    pub const fn text(field: F, key: &'static str, test: FieldTest) -> Self {
        Self::with(field, key, FieldShape::Text, MergeRule::Override, test)
    }

    pub const fn integer(field: F, key: &'static str, test: FieldTest) -> Self {
        Self::with(field, key, FieldShape::Integer, MergeRule::Override, test)
    }

    pub const fn timestamp(field: F, key: &'static str, test: FieldTest) -> Self {
        Self::with(field, key, FieldShape::Timestamp, MergeRule::Override, test)
    }

    pub const fn list(field: F, key: &'static str, test: FieldTest) -> Self {
        Self::with(field, key, FieldShape::TextList, MergeRule::Replace, test)
    }

    pub const fn flag(field: F, key: &'static str, test: FieldTest) -> Self {
        Self::with(field, key, FieldShape::Flag, MergeRule::Union, test)
    }

    pub const fn suspension(field: F, key: &'static str, column: &'static str) -> Self {
        Self::with(
            field,
            key,
            FieldShape::Suspension,
            MergeRule::Override,
            FieldTest::Suspension(column),
        )
    }

    /// Forbid the field inside an `or()` group.
    pub const fn conjunction_only(mut self) -> Self {
        self.in_disjunct = false;
        self
    }

    /// Require one of `fields` to be set before this one.
    pub const fn requires_any(mut self, fields: &'static [F]) -> Self {
        self.requires_any = fields;
        self
    }

    /// Let `flag` widen the test to records where the column is missing.
    pub const fn null_accepted_by(mut self, flag: F) -> Self {
        self.null_accepted_by = Some(flag);
        self
    }
}

/// Where a mutual exclusion applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionScope {
    /// On the root and inside every `or()` group.
    Always,
    /// Only on the root; inside an `or()` group both may be set.
    ConjunctionOnly,
}

/// Two fields that must not be set on the same target.
#[derive(Debug, Clone, Copy)]
pub struct ExclusionRule<F: 'static> {
    pub first: F,
    pub second: F,
    pub scope: ExclusionScope,
}

impl<F: Copy + PartialEq> ExclusionRule<F> {
    pub const fn always(first: F, second: F) -> Self {
        Self {
            first,
            second,
            scope: ExclusionScope::Always,
        }
    }

    pub const fn conjunction_only(first: F, second: F) -> Self {
        Self {
            first,
            second,
            scope: ExclusionScope::ConjunctionOnly,
        }
    }

    /// The other side of the rule if `field` is one of its sides.
    pub fn counterpart(&self, field: F) -> Option<F> {
        if self.first == field {
            Some(self.second)
        } else if self.second == field {
            Some(self.first)
        } else {
            None
        }
    }

    pub fn applies(&self, in_disjunct: bool) -> bool {
        match self.scope {
            ExclusionScope::Always => true,
            ExclusionScope::ConjunctionOnly => !in_disjunct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Demo {
        A,
        B,
        C,
    }

    #[test]
    fn test_descriptor_defaults() {
        let text = FieldDescriptor::text(Demo::A, "a", FieldTest::Equals("a"));
        assert_eq!(text.merge, MergeRule::Override);
        assert!(text.in_disjunct);

        let list = FieldDescriptor::list(Demo::B, "b", FieldTest::In("b"));
        assert_eq!(list.merge, MergeRule::Replace);

        let flag = FieldDescriptor::flag(Demo::C, "c", FieldTest::Modifier)
            .conjunction_only()
            .requires_any(&[Demo::A]);
        assert_eq!(flag.merge, MergeRule::Union);
        assert!(!flag.in_disjunct);
        assert_eq!(flag.requires_any, &[Demo::A]);
        assert_eq!(flag.null_accepted_by, None);

        let before = FieldDescriptor::timestamp(Demo::A, "a", FieldTest::LessThan("at"))
            .null_accepted_by(Demo::C);
        assert_eq!(before.null_accepted_by, Some(Demo::C));
        assert_eq!(before.test.column(), Some("at"));
        assert_eq!(FieldTest::Modifier.column(), None);
    }

    #[test]
    fn test_exclusion_counterpart() {
        let rule = ExclusionRule::conjunction_only(Demo::A, Demo::B);
        assert_eq!(rule.counterpart(Demo::A), Some(Demo::B));
        assert_eq!(rule.counterpart(Demo::B), Some(Demo::A));
        assert_eq!(rule.counterpart(Demo::C), None);
        assert!(rule.applies(false));
        assert!(!rule.applies(true));
        assert!(ExclusionRule::always(Demo::A, Demo::C).applies(true));
    }

    #[test]
    fn test_compare_same_shape_only() {
        assert_eq!(
            FieldValue::Integer(1).compare(&FieldValue::Integer(2)),
            Some(Ordering::Less)
        );
        assert_eq!(FieldValue::Integer(1).compare(&FieldValue::Text("1".into())), None);
    }
}
