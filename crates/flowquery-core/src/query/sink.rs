//! Contract for executors of prepared queries.

use crate::error::BoxError;
use crate::query::entity::EntityKind;
use crate::query::prepare::PreparedQuery;

/// A window into the result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub first: usize,
    pub max: usize,
}

impl Page {
    pub fn new(first: usize, max: usize) -> Self {
        Self { first, max }
    }
}

/// Executes a prepared query against a store.
///
/// The executor receives the normalized root, every `or()` group and the
/// resolved candidate groups. It is never called for a query that was
/// detected as unsatisfiable.
pub trait ExecutionSink<E: EntityKind> {
    type Item;

    fn count(&self, query: &PreparedQuery<E>) -> Result<u64, BoxError>;

    fn list(&self, query: &PreparedQuery<E>, page: Option<Page>) -> Result<Vec<Self::Item>, BoxError>;
}
