//! Identity lookups and candidate-group resolution.

pub mod candidate;
pub mod identity;

pub use candidate::{resolve_candidate_groups, GroupSet};
pub use identity::{IdentityProvider, MemoryIdentityProvider};
