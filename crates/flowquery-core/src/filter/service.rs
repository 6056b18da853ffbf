//! Storage and execution of saved filters.

use crate::error::{QueryError, QueryResult};
use crate::filter::json;
use crate::query::entity::EntityKind;
use crate::query::prepare::QueryContext;
use crate::query::sink::ExecutionSink;
use crate::query::Query;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// A named query stored for later execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilter {
    /// Assigned by [`FilterService::create`] when empty.
    #[serde(default)]
    pub id: String,
    /// Entity the query targets, e.g. `"Task"`.
    pub resource_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// The query in its saved-filter JSON form.
    pub query: serde_json::Value,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl SavedFilter {
    /// Capture `query` under `name`.
    pub fn from_query<E: EntityKind>(name: impl Into<String>, query: &Query<E>) -> QueryResult<Self> {
        Ok(Self {
            id: String::new(),
            resource_type: E::NAME.to_string(),
            name: name.into(),
            owner: None,
            query: json::to_json(query)?,
            properties: serde_json::Map::new(),
        })
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Decode the stored query. The resource type must be `E`.
    pub fn query<E: EntityKind>(&self) -> QueryResult<Query<E>> {
        if self.resource_type != E::NAME {
            return Err(QueryError::usage(format!(
                "filter {} targets {} and cannot be used as a {} query",
                self.id,
                self.resource_type,
                E::NAME
            )));
        }
        json::from_json(&self.query)
    }
}

/// In-process registry of saved filters.
pub struct FilterService {
    filters: RwLock<HashMap<String, SavedFilter>>,
    next_id: AtomicU64,
}

impl Default for FilterService {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterService {
    pub fn new() -> Self {
        Self {
            filters: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store a filter and return it with its id.
    pub fn create(&self, mut filter: SavedFilter) -> QueryResult<SavedFilter> {
        if filter.name.trim().is_empty() {
            return Err(QueryError::usage("filter name must not be empty"));
        }
        if filter.resource_type.trim().is_empty() {
            return Err(QueryError::usage("filter resource type must not be empty"));
        }
        if filter.id.is_empty() {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            filter.id = format!("filter-{}", n);
        }

        let mut filters = self.filters.write();
        if filters.contains_key(&filter.id) {
            return Err(QueryError::usage(format!("filter {} already exists", filter.id)));
        }
        filters.insert(filter.id.clone(), filter.clone());
        info!(id = %filter.id, resource_type = %filter.resource_type, "filter created");
        Ok(filter)
    }

    pub fn get(&self, id: &str) -> QueryResult<SavedFilter> {
        self.filters
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| QueryError::FilterNotFound(id.to_string()))
    }

    /// Replace a stored filter. The resource type cannot change.
    pub fn update(&self, filter: SavedFilter) -> QueryResult<()> {
        let mut filters = self.filters.write();
        let existing = filters
            .get_mut(&filter.id)
            .ok_or_else(|| QueryError::FilterNotFound(filter.id.clone()))?;
        if existing.resource_type != filter.resource_type {
            return Err(QueryError::usage(format!(
                "cannot change the resource type of filter {} from {} to {}",
                filter.id, existing.resource_type, filter.resource_type
            )));
        }
        info!(id = %filter.id, "filter updated");
        *existing = filter;
        Ok(())
    }

    pub fn delete(&self, id: &str) -> QueryResult<SavedFilter> {
        let removed = self
            .filters
            .write()
            .remove(id)
            .ok_or_else(|| QueryError::FilterNotFound(id.to_string()))?;
        info!(id, "filter deleted");
        Ok(removed)
    }

    /// All filters, ordered by name then id.
    pub fn list(&self) -> Vec<SavedFilter> {
        let mut filters: Vec<SavedFilter> = self.filters.read().values().cloned().collect();
        filters.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        filters
    }

    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }

    /// The stored query of filter `id`, merged with `extension` if given.
    pub fn resolve<E: EntityKind>(&self, id: &str, extension: Option<&Query<E>>) -> QueryResult<Query<E>> {
        let filter = self.get(id)?;
        let query = filter.query::<E>()?;
        debug!(id, extended = extension.is_some(), "resolving filter query");
        match extension {
            Some(extension) => query.extend(extension),
            None => Ok(query),
        }
    }

    pub fn count<E, S>(
        &self,
        id: &str,
        extension: Option<&Query<E>>,
        ctx: &QueryContext<'_>,
        sink: &S,
    ) -> QueryResult<u64>
    where
        E: EntityKind,
        S: ExecutionSink<E> + ?Sized,
    {
        self.resolve(id, extension)?.count(ctx, sink)
    }

    pub fn list_results<E, S>(
        &self,
        id: &str,
        extension: Option<&Query<E>>,
        ctx: &QueryContext<'_>,
        sink: &S,
    ) -> QueryResult<Vec<S::Item>>
    where
        E: EntityKind,
        S: ExecutionSink<E> + ?Sized,
    {
        self.resolve(id, extension)?.list(ctx, sink)
    }

    pub fn list_page<E, S>(
        &self,
        id: &str,
        extension: Option<&Query<E>>,
        ctx: &QueryContext<'_>,
        sink: &S,
        first: usize,
        max: usize,
    ) -> QueryResult<Vec<S::Item>>
    where
        E: EntityKind,
        S: ExecutionSink<E> + ?Sized,
    {
        self.resolve(id, extension)?.list_page(ctx, sink, first, max)
    }
}
