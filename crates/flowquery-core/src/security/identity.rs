//! Identity provider contract.

use crate::error::BoxError;
use std::collections::HashMap;

/// Resolves the groups a user belongs to.
///
/// Implementations may perform I/O. Errors are propagated to the caller of
/// the query unchanged.
pub trait IdentityProvider: Send + Sync {
    fn groups_of_user(&self, user_id: &str) -> Result<Vec<String>, BoxError>;
}

/// Identity provider backed by an in-memory membership map.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityProvider {
    memberships: HashMap<String, Vec<String>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_memberships(memberships: HashMap<String, Vec<String>>) -> Self {
        Self { memberships }
    }

    /// Add `user` to `group`.
    pub fn add_membership(&mut self, user: impl Into<String>, group: impl Into<String>) {
        let groups = self.memberships.entry(user.into()).or_default();
        let group = group.into();
        if !groups.contains(&group) {
            groups.push(group);
        }
    }

    pub fn with_membership(mut self, user: impl Into<String>, group: impl Into<String>) -> Self {
        self.add_membership(user, group);
        self
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    fn groups_of_user(&self, user_id: &str) -> Result<Vec<String>, BoxError> {
        Ok(self.memberships.get(user_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memberships() {
        let provider = MemoryIdentityProvider::new()
            .with_membership("kermit", "management")
            .with_membership("kermit", "accounting")
            .with_membership("kermit", "management");
        assert_eq!(
            provider.groups_of_user("kermit").unwrap(),
            vec!["management".to_string(), "accounting".to_string()]
        );
        assert!(provider.groups_of_user("gonzo").unwrap().is_empty());
    }
}
