//! Detection of filter combinations that can never match.

use crate::query::entity::{EntityKind, ExcludedWhen, MembershipCheck, RangeCheck};
use crate::query::field::FieldValue;
use crate::query::predicate::Predicate;
use std::cmp::Ordering;
use std::fmt;

/// Why a query returns no results without being executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// The candidate group filters have no group in common.
    NoCandidateGroups,
    /// Range bounds are not in ascending order.
    RangeNotAscending(Vec<&'static str>),
    /// An element/set membership can never hold.
    Membership {
        element: &'static str,
        set: &'static str,
    },
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyReason::NoCandidateGroups => write!(f, "candidate group filters do not intersect"),
            EmptyReason::RangeNotAscending(keys) => {
                write!(f, "{} are not in ascending order", keys.join(" <= "))
            }
            EmptyReason::Membership { element, set } => {
                write!(f, "{} conflicts with {}", element, set)
            }
        }
    }
}

/// True if the set values are not non-decreasing. Unset values are skipped.
pub fn not_in_ascending_order<'a>(values: impl IntoIterator<Item = Option<&'a FieldValue>>) -> bool {
    let present: Vec<&FieldValue> = values.into_iter().flatten().collect();
    present
        .windows(2)
        .any(|pair| pair[0].compare(pair[1]) == Some(Ordering::Greater))
}

fn range_violated<E: EntityKind>(predicate: &Predicate<E>, check: &RangeCheck<E::Field>) -> bool {
    not_in_ascending_order(check.fields.iter().map(|f| predicate.get(*f)))
}

fn membership_violated<E: EntityKind>(
    predicate: &Predicate<E>,
    check: &MembershipCheck<E::Field>,
) -> bool {
    let Some(set) = predicate.list(check.set) else {
        return false;
    };
    match (check.excluded_when, predicate.get(check.element)) {
        (ExcludedWhen::ElementMissingFrom, Some(FieldValue::Text(element))) => {
            !set.contains(element)
        }
        (ExcludedWhen::ElementFoundIn, Some(FieldValue::Text(element))) => set.contains(element),
        (ExcludedWhen::AllFoundIn, Some(FieldValue::TextList(elements))) => {
            elements.iter().all(|e| set.contains(e))
        }
        _ => false,
    }
}

fn key<E: EntityKind>(field: E::Field) -> &'static str {
    E::descriptor(field).map_or("?", |d| d.key)
}

/// First excluding condition found on `predicate`.
pub fn excluding_reason<E: EntityKind>(predicate: &Predicate<E>) -> Option<EmptyReason> {
    for check in E::range_checks() {
        if range_violated(predicate, check) {
            let keys = check.fields.iter().map(|f| key::<E>(*f)).collect();
            return Some(EmptyReason::RangeNotAscending(keys));
        }
    }
    for check in E::membership_checks() {
        if membership_violated(predicate, check) {
            return Some(EmptyReason::Membership {
                element: key::<E>(check.element),
                set: key::<E>(check.set),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_order_ignores_unset() {
        let low = FieldValue::Integer(10);
        let high = FieldValue::Integer(50);
        assert!(!not_in_ascending_order([Some(&low), None, Some(&high)]));
        assert!(not_in_ascending_order([Some(&high), None, Some(&low)]));
        assert!(!not_in_ascending_order([None, Some(&low), None]));
        assert!(!not_in_ascending_order([Some(&low), Some(&low)]));
    }

    #[test]
    fn test_reason_display() {
        let reason = EmptyReason::RangeNotAscending(vec!["dueAfter", "due", "dueBefore"]);
        assert_eq!(reason.to_string(), "dueAfter <= due <= dueBefore are not in ascending order");
    }
}
