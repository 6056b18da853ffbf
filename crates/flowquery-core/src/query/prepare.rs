//! Finalization and execution of a composed query.

use crate::config::{Dialect, EngineConfig};
use crate::error::{QueryError, QueryResult};
use crate::query::compare::{excluding_reason, EmptyReason};
use crate::query::composer::Query;
use crate::query::entity::EntityKind;
use crate::query::predicate::Predicate;
use crate::query::sink::{ExecutionSink, Page};
use crate::security::candidate::resolve_predicate;
use crate::security::IdentityProvider;
use crate::variable::SerializerRegistry;
use tracing::{debug, instrument};

/// Collaborators needed to finalize a query.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    pub config: &'a EngineConfig,
    pub serializers: &'a dyn SerializerRegistry,
    pub identity: &'a dyn IdentityProvider,
}

impl<'a> QueryContext<'a> {
    pub fn new(
        config: &'a EngineConfig,
        serializers: &'a dyn SerializerRegistry,
        identity: &'a dyn IdentityProvider,
    ) -> Self {
        Self {
            config,
            serializers,
            identity,
        }
    }
}

/// Normalized snapshot handed to an [`ExecutionSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery<E: EntityKind> {
    pub root: Predicate<E>,
    pub disjuncts: Vec<Predicate<E>>,
}

impl<E: EntityKind> PreparedQuery<E> {
    /// Root first, then every `or()` group.
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate<E>> {
        std::iter::once(&self.root).chain(self.disjuncts.iter())
    }
}

/// Outcome of preparing a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan<E: EntityKind> {
    /// The query cannot match anything. Do not execute it.
    Empty(EmptyReason),
    Execute(PreparedQuery<E>),
}

impl<E: EntityKind> Query<E> {
    /// Normalize every variable condition on the root and every `or()` group.
    pub fn ensure_variables_initialized(
        &mut self,
        registry: &dyn SerializerRegistry,
        dialect: Dialect,
    ) -> QueryResult<()> {
        for predicate in std::iter::once(&mut self.root).chain(self.disjuncts.iter_mut()) {
            for condition in predicate.variables_mut() {
                condition.normalize(registry, dialect)?;
            }
        }
        Ok(())
    }

    /// Resolve candidate groups wherever they are stale.
    pub fn resolve_candidate_groups(
        &mut self,
        identity: &dyn IdentityProvider,
        config: &EngineConfig,
    ) -> QueryResult<()> {
        let Some(fields) = E::candidate_fields() else {
            return Ok(());
        };
        let Query {
            root,
            disjuncts,
            user_groups,
            ..
        } = self;
        for predicate in std::iter::once(root).chain(disjuncts.iter_mut()) {
            resolve_predicate(predicate, &fields, identity, user_groups, config.cache_user_groups)?;
        }
        Ok(())
    }

    /// Why the root can never match, if it cannot.
    ///
    /// Only the root is inspected: inside an `or()` group an impossible
    /// filter only removes one alternative.
    pub fn excluding_reason(&self) -> Option<EmptyReason> {
        if let Some(reason) = excluding_reason(&self.root) {
            return Some(reason);
        }
        let fields = E::candidate_fields()?;
        let both_set = self.root.is_set(fields.group) && self.root.is_set(fields.groups);
        if both_set && self.root.candidate_groups().is_some_and(|g| g.is_empty()) {
            return Some(EmptyReason::NoCandidateGroups);
        }
        None
    }

    /// Normalize, resolve and check the query.
    #[instrument(skip_all, fields(entity = E::NAME))]
    pub fn prepare(&mut self, ctx: &QueryContext<'_>) -> QueryResult<Plan<E>> {
        self.ensure_variables_initialized(ctx.serializers, ctx.config.dialect)?;
        self.resolve_candidate_groups(ctx.identity, ctx.config)?;

        if let Some(reason) = self.excluding_reason() {
            debug!(%reason, "query short-circuits to an empty result");
            return Ok(Plan::Empty(reason));
        }
        Ok(Plan::Execute(PreparedQuery {
            root: self.root.clone(),
            disjuncts: self.disjuncts.clone(),
        }))
    }

    /// Number of matching entities.
    pub fn count<S>(&mut self, ctx: &QueryContext<'_>, sink: &S) -> QueryResult<u64>
    where
        S: ExecutionSink<E> + ?Sized,
    {
        match self.prepare(ctx)? {
            Plan::Empty(_) => Ok(0),
            Plan::Execute(prepared) => sink.count(&prepared).map_err(QueryError::Sink),
        }
    }

    /// All matching entities. Refused when a result limit is configured.
    pub fn list<S>(&mut self, ctx: &QueryContext<'_>, sink: &S) -> QueryResult<Vec<S::Item>>
    where
        S: ExecutionSink<E> + ?Sized,
    {
        if let Some(limit) = ctx.config.query_max_results {
            return Err(QueryError::usage(format!(
                "an unbounded number of results is forbidden, use list_page with at most {} results",
                limit
            )));
        }
        self.execute_list(ctx, sink, None)
    }

    /// One page of matching entities.
    pub fn list_page<S>(
        &mut self,
        ctx: &QueryContext<'_>,
        sink: &S,
        first: usize,
        max: usize,
    ) -> QueryResult<Vec<S::Item>>
    where
        S: ExecutionSink<E> + ?Sized,
    {
        if let Some(limit) = ctx.config.query_max_results {
            if max > limit {
                return Err(QueryError::usage(format!(
                    "max results limit of {} exceeded",
                    limit
                )));
            }
        }
        self.execute_list(ctx, sink, Some(Page::new(first, max)))
    }

    fn execute_list<S>(
        &mut self,
        ctx: &QueryContext<'_>,
        sink: &S,
        page: Option<Page>,
    ) -> QueryResult<Vec<S::Item>>
    where
        S: ExecutionSink<E> + ?Sized,
    {
        match self.prepare(ctx)? {
            Plan::Empty(_) => Ok(Vec::new()),
            Plan::Execute(prepared) => sink.list(&prepared, page).map_err(QueryError::Sink),
        }
    }
}
