//! The AND/OR query composer.
//!
//! A [`Query`] holds a root conjunction and a list of `or()` groups. Filter
//! calls land on the active target: the root, or the group opened by the
//! last `or()` until `end_or()` closes it. Every mutation is validated
//! before it is stored, so a query never holds an illegal combination.

use crate::error::{QueryError, QueryResult};
use crate::query::entity::EntityKind;
use crate::query::field::{FieldValue, SuspensionState};
use crate::query::predicate::{OrderTarget, OrderingProperty, Predicate};
use crate::variable::VariableCondition;
use chrono::{DateTime, Utc};
use flowquery_proto::{OrderDirection, QueryOperator, ValueKind, VariableScope, VariableValue};
use std::collections::HashMap;

/// Handle to an `or()` group, returned by [`Query::current_disjunct`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisjunctId(usize);

/// A query over entity `E`.
#[derive(Debug, Clone)]
pub struct Query<E: EntityKind> {
    pub(crate) root: Predicate<E>,
    pub(crate) disjuncts: Vec<Predicate<E>>,
    open: Option<usize>,
    pub(crate) variable_names_ignore_case: bool,
    pub(crate) variable_values_ignore_case: bool,
    /// User to groups lookups, shared by the root and its `or()` groups.
    pub(crate) user_groups: HashMap<String, Vec<String>>,
}

impl<E: EntityKind> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKind> Query<E> {
    pub fn new() -> Self {
        Self {
            root: Predicate::new(false),
            disjuncts: Vec::new(),
            open: None,
            variable_names_ignore_case: false,
            variable_values_ignore_case: false,
            user_groups: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Predicate<E> {
        &self.root
    }

    pub fn disjuncts(&self) -> &[Predicate<E>] {
        &self.disjuncts
    }

    /// True while an `or()` group is open.
    pub fn is_or_active(&self) -> bool {
        self.open.is_some()
    }

    /// The open `or()` group, if any.
    pub fn current_disjunct(&self) -> Option<DisjunctId> {
        self.open.map(DisjunctId)
    }

    pub fn variable_names_ignore_case(&self) -> bool {
        self.variable_names_ignore_case
    }

    pub fn variable_values_ignore_case(&self) -> bool {
        self.variable_values_ignore_case
    }

    /// Open a new `or()` group. Fails if one is already open.
    pub fn or(&mut self) -> QueryResult<&mut Self> {
        if self.open.is_some() {
            return Err(QueryError::usage("cannot set or() within 'or' query"));
        }
        self.disjuncts.push(Predicate::new(true));
        self.open = Some(self.disjuncts.len() - 1);
        Ok(self)
    }

    /// Close the open `or()` group.
    pub fn end_or(&mut self) -> QueryResult<&mut Self> {
        if self.open.is_none() {
            return Err(QueryError::usage("cannot set endOr() before or()"));
        }
        self.open = None;
        Ok(self)
    }

    /// Close a specific `or()` group.
    ///
    /// Only the most recently opened group can be closed, and only while it
    /// is still open.
    pub fn end_disjunct(&mut self, id: DisjunctId) -> QueryResult<&mut Self> {
        match self.open {
            None => Err(QueryError::usage("cannot set endOr() before or()")),
            Some(open) if open != id.0 => Err(QueryError::usage(
                "cannot set endOr() on an 'or' query that is not the most recently opened one",
            )),
            Some(_) => {
                self.open = None;
                Ok(self)
            }
        }
    }

    fn active_target(&self) -> &Predicate<E> {
        match self.open {
            Some(index) => &self.disjuncts[index],
            None => &self.root,
        }
    }

    fn active_mut(&mut self) -> &mut Predicate<E> {
        match self.open {
            Some(index) => &mut self.disjuncts[index],
            None => &mut self.root,
        }
    }

    /// Set a scalar filter on the active target.
    ///
    /// Checks the value shape, whether the field is allowed inside an `or()`
    /// group, its prerequisites and its mutual exclusions before storing.
    pub fn set(&mut self, field: E::Field, value: FieldValue) -> QueryResult<&mut Self> {
        let descriptor = E::descriptor(field).ok_or_else(|| {
            QueryError::usage(format!("{:?} is not a filter of {} queries", field, E::NAME))
        })?;
        let key = descriptor.key;

        if value.shape() != descriptor.shape {
            return Err(QueryError::usage(format!(
                "{} expects a {} value, got {}",
                key,
                descriptor.shape.as_str(),
                value.shape().as_str()
            )));
        }
        if let FieldValue::TextList(items) = &value {
            if items.is_empty() {
                return Err(QueryError::usage(format!("{} must not be empty", key)));
            }
        }

        let in_disjunct = self.open.is_some();
        if in_disjunct && !descriptor.in_disjunct {
            return Err(QueryError::usage(format!("cannot set {} within 'or' query", key)));
        }

        let target = self.active_target();
        if !descriptor.requires_any.is_empty()
            && !descriptor.requires_any.iter().any(|f| target.is_set(*f))
        {
            let names: Vec<&str> = descriptor
                .requires_any
                .iter()
                .filter_map(|f| E::descriptor(*f).map(|d| d.key))
                .collect();
            return Err(QueryError::usage(format!(
                "{} has to be set before '{}'",
                names.join(" or "),
                key
            )));
        }

        for rule in E::exclusions() {
            if !rule.applies(in_disjunct) {
                continue;
            }
            if let Some(other) = rule.counterpart(field) {
                if target.is_set(other) {
                    let first = E::descriptor(rule.first).map_or("?", |d| d.key);
                    let second = E::descriptor(rule.second).map_or("?", |d| d.key);
                    return Err(QueryError::usage(format!(
                        "cannot set both {} and {}",
                        first, second
                    )));
                }
            }
        }

        let contributes = E::candidate_fields().is_some_and(|c| c.contributes(field));
        let target = self.active_mut();
        target.insert(field, value);
        if contributes {
            target.invalidate_candidate_groups();
        }
        Ok(self)
    }

    pub fn set_text(&mut self, field: E::Field, value: impl Into<String>) -> QueryResult<&mut Self> {
        self.set(field, FieldValue::Text(value.into()))
    }

    pub fn set_integer(&mut self, field: E::Field, value: i64) -> QueryResult<&mut Self> {
        self.set(field, FieldValue::Integer(value))
    }

    pub fn set_timestamp(&mut self, field: E::Field, value: DateTime<Utc>) -> QueryResult<&mut Self> {
        self.set(field, FieldValue::Timestamp(value))
    }

    pub fn set_list<I, S>(&mut self, field: E::Field, values: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(field, FieldValue::TextList(values.into_iter().map(Into::into).collect()))
    }

    pub fn set_flag(&mut self, field: E::Field) -> QueryResult<&mut Self> {
        self.set(field, FieldValue::Flag)
    }

    pub fn set_suspension(&mut self, field: E::Field, state: SuspensionState) -> QueryResult<&mut Self> {
        self.set(field, FieldValue::Suspension(state))
    }

    /// Add a variable condition to the active target.
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        scope: VariableScope,
        operator: QueryOperator,
        value: impl Into<VariableValue>,
    ) -> QueryResult<&mut Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(QueryError::usage("variable name must not be empty"));
        }
        if !E::variable_scopes().contains(&scope) {
            return Err(QueryError::usage(format!(
                "{} queries do not support {} variables",
                E::NAME,
                scope
            )));
        }

        let mut condition = VariableCondition::new(name, scope, operator, value.into())?;
        condition.name_ignore_case = self.variable_names_ignore_case;
        condition.value_ignore_case = self.variable_values_ignore_case;
        self.active_mut().push_variable(condition);
        Ok(self)
    }

    /// Match variable names case-insensitively, including conditions that
    /// were added before this call.
    pub fn match_variable_names_ignore_case(&mut self) -> &mut Self {
        self.variable_names_ignore_case = true;
        self.apply_case_flags();
        self
    }

    /// Match string variable values case-insensitively, including
    /// conditions that were added before this call.
    pub fn match_variable_values_ignore_case(&mut self) -> &mut Self {
        self.variable_values_ignore_case = true;
        self.apply_case_flags();
        self
    }

    pub(crate) fn apply_case_flags(&mut self) {
        let names = self.variable_names_ignore_case;
        let values = self.variable_values_ignore_case;
        for predicate in std::iter::once(&mut self.root).chain(self.disjuncts.iter_mut()) {
            for condition in predicate.variables_mut() {
                condition.name_ignore_case |= names;
                condition.value_ignore_case |= values;
            }
        }
    }

    /// Order results by a property. Not allowed inside an `or()` group.
    pub fn order_by(&mut self, key: &str, direction: OrderDirection) -> QueryResult<&mut Self> {
        if self.open.is_some() {
            return Err(QueryError::usage(format!(
                "cannot set orderBy({}) within 'or' query",
                key
            )));
        }
        let key = E::sort_keys()
            .iter()
            .copied()
            .find(|k| *k == key)
            .ok_or_else(|| {
                QueryError::usage(format!("{} queries cannot be ordered by {}", E::NAME, key))
            })?;
        self.root.push_ordering(OrderingProperty {
            target: OrderTarget::Property(key),
            direction,
        });
        Ok(self)
    }

    /// Order results by the value of a variable.
    pub fn order_by_variable(
        &mut self,
        name: impl Into<String>,
        scope: VariableScope,
        kind: ValueKind,
        direction: OrderDirection,
    ) -> QueryResult<&mut Self> {
        let name = name.into();
        if self.open.is_some() {
            return Err(QueryError::usage(format!(
                "cannot set orderBy({}) within 'or' query",
                name
            )));
        }
        if !E::variable_scopes().contains(&scope) {
            return Err(QueryError::usage(format!(
                "{} queries do not support {} variables",
                E::NAME,
                scope
            )));
        }
        if !kind.is_primitive() {
            return Err(crate::operator::non_queryable(kind));
        }
        self.root.push_ordering(OrderingProperty {
            target: OrderTarget::Variable { name, scope, kind },
            direction,
        });
        Ok(self)
    }
}
