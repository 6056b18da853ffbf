//! Query extension: merging a saved query with caller refinements.

use crate::error::QueryResult;
use crate::query::composer::Query;
use crate::query::entity::EntityKind;
use crate::query::field::{FieldValue, MergeRule};
use tracing::{debug, instrument};

impl<E: EntityKind> Query<E> {
    /// Merge `extension` on top of this query into a new query.
    ///
    /// Each root field is combined by the merge rule of its descriptor:
    /// scalars and collections take the extension's value when it has one,
    /// flags are set if either side sets them. Merged fields go through the
    /// validating setter in table order, so a combination that could not be
    /// built by hand fails here too.
    ///
    /// Variable conditions: the extension's, then every base condition whose
    /// (name, scope) the extension does not declare. Ordering: the base's
    /// then the extension's, not deduplicated. `or()` groups: the base's then
    /// the extension's. Neither input is modified.
    #[instrument(skip_all, fields(entity = E::NAME))]
    pub fn extend(&self, extension: &Query<E>) -> QueryResult<Query<E>> {
        let mut merged = Query::new();
        merged.variable_names_ignore_case =
            self.variable_names_ignore_case || extension.variable_names_ignore_case;
        merged.variable_values_ignore_case =
            self.variable_values_ignore_case || extension.variable_values_ignore_case;

        for descriptor in E::descriptors() {
            let base = self.root.get(descriptor.field);
            let ext = extension.root.get(descriptor.field);
            let chosen = match descriptor.merge {
                MergeRule::Override | MergeRule::Replace => ext.or(base).cloned(),
                MergeRule::Union => (base.is_some() || ext.is_some()).then_some(FieldValue::Flag),
            };
            if let Some(value) = chosen {
                merged.set(descriptor.field, value)?;
            }
        }

        let ext_vars = extension.root.variables();
        for condition in ext_vars {
            merged.root.push_variable(condition.clone());
        }
        for condition in self.root.variables() {
            if !ext_vars.iter().any(|c| c.same_identity(condition)) {
                merged.root.push_variable(condition.clone());
            }
        }

        for property in self.root.ordering().iter().chain(extension.root.ordering()) {
            merged.root.push_ordering(property.clone());
        }

        for disjunct in self.disjuncts.iter().chain(&extension.disjuncts) {
            merged.disjuncts.push(disjunct.as_disjunct());
        }

        merged.apply_case_flags();
        debug!(
            fields = merged.root.fields().count(),
            variables = merged.root.variables().len(),
            disjuncts = merged.disjuncts.len(),
            "extended query"
        );
        Ok(merged)
    }
}
