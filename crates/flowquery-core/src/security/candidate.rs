//! Candidate-group resolution.

use crate::error::{QueryError, QueryResult};
use crate::query::entity::{CandidateFields, EntityKind};
use crate::query::predicate::Predicate;
use crate::security::identity::IdentityProvider;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Set of group ids.
pub type GroupSet = BTreeSet<String>;

/// Combine the explicit group filters and a candidate user's groups.
///
/// On the root a single group and a group list must both hold, so the
/// result is their intersection. Inside an `or()` group either may hold,
/// so the result is their union. The candidate user's groups are added to
/// whatever the explicit filters produced, or form the whole result when
/// no explicit filter is set.
///
/// `None` means no group constraint. `Some` of an empty set means no group
/// can satisfy the query.
pub fn resolve_candidate_groups(
    single: Option<&str>,
    list: Option<&[String]>,
    user_groups: Option<&[String]>,
    in_disjunct: bool,
) -> Option<GroupSet> {
    let explicit = match (single, list) {
        (Some(group), Some(list)) => {
            let mut merged: GroupSet = list.iter().cloned().collect();
            if !in_disjunct {
                merged.retain(|g| g == group);
            } else {
                merged.insert(group.to_string());
            }
            Some(merged)
        }
        (Some(group), None) => Some(GroupSet::from([group.to_string()])),
        (None, Some(list)) => Some(list.iter().cloned().collect()),
        (None, None) => None,
    };

    match (explicit, user_groups) {
        (explicit, None) => explicit,
        (None, Some(user_groups)) => Some(user_groups.iter().cloned().collect()),
        (Some(mut merged), Some(user_groups)) => {
            merged.extend(user_groups.iter().cloned());
            Some(merged)
        }
    }
}

/// Resolve and cache the candidate groups of one predicate.
///
/// User lookups go through `user_groups`, which is owned by the query and
/// shared by the root and all of its `or()` groups.
pub(crate) fn resolve_predicate<E: EntityKind>(
    predicate: &mut Predicate<E>,
    fields: &CandidateFields<E::Field>,
    identity: &dyn IdentityProvider,
    user_groups: &mut HashMap<String, Vec<String>>,
    cache_user_groups: bool,
) -> QueryResult<()> {
    if predicate.is_candidate_resolved() {
        return Ok(());
    }

    let lookup = match predicate.text(fields.user) {
        Some(user) => Some(groups_of(user, identity, user_groups, cache_user_groups)?),
        None => None,
    };

    let resolved = resolve_candidate_groups(
        predicate.text(fields.group),
        predicate.list(fields.groups),
        lookup.as_deref(),
        predicate.is_disjunct(),
    );
    debug!(entity = E::NAME, disjunct = predicate.is_disjunct(), groups = ?resolved, "resolved candidate groups");
    predicate.store_candidate_groups(resolved);
    Ok(())
}

fn groups_of(
    user: &str,
    identity: &dyn IdentityProvider,
    cache: &mut HashMap<String, Vec<String>>,
    use_cache: bool,
) -> QueryResult<Vec<String>> {
    if use_cache {
        if let Some(groups) = cache.get(user) {
            return Ok(groups.clone());
        }
    }
    let groups = identity.groups_of_user(user).map_err(QueryError::Identity)?;
    if use_cache {
        cache.insert(user.to_string(), groups.clone());
    }
    Ok(groups)
}
