//! Relationship query builder and resolution.
//!
//! Each bound constraint maps to a candidate sequence set from the most
//! selective available index: role index for role parameters, name index
//! for the name parameter, attribute index when the attribute is opted
//! in, and a linear filter pass otherwise. The result is the
//! intersection of all candidate sets, intersected smallest-set-first
//! and materialized ascending by creation sequence, so repeated queries
//! without intervening writes return identical ordered results.

use std::sync::Arc;

use idgraph_store::{GraphStore, PersistenceBackend};
use idgraph_types::{
    AttributeValue, Error, ParameterTarget, QueryParameter, QueryValue, Relationship,
    RelationshipKind, Result,
};
use tracing::debug;

#[derive(Debug)]
struct Constraint {
    parameter: QueryParameter,
    value: QueryValue,
}

/// A query over relationships of one kind.
///
/// Obtained from [`IdentityManager::new_query`]; constraints are bound
/// with [`QueryBuilder::set`] and resolved with [`QueryBuilder::execute`].
/// Zero constraints means "all relationships of this kind".
///
/// [`IdentityManager::new_query`]: crate::IdentityManager::new_query
pub struct QueryBuilder<'a, B: PersistenceBackend> {
    store: &'a GraphStore<B>,
    kind: Arc<RelationshipKind>,
    constraints: Vec<Constraint>,
}

impl<B: PersistenceBackend> std::fmt::Debug for QueryBuilder<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("kind", &self.kind)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}

impl<'a, B: PersistenceBackend> QueryBuilder<'a, B> {
    pub(crate) fn new(store: &'a GraphStore<B>, kind: Arc<RelationshipKind>) -> Self {
        Self {
            store,
            kind,
            constraints: Vec::new(),
        }
    }

    /// Bind a constraint.
    ///
    /// Fails with [`Error::SchemaMismatch`] when the parameter does not
    /// belong to the queried kind, or when the value's shape does not
    /// fit the parameter's target.
    pub fn set(mut self, parameter: QueryParameter, value: QueryValue) -> Result<Self> {
        parameter.validate_for(&self.kind)?;
        if !value.matches(parameter.target()) {
            return Err(Error::SchemaMismatch {
                parameter: parameter.name().to_string(),
                kind: self.kind.type_id.clone(),
            });
        }
        self.constraints.push(Constraint { parameter, value });
        Ok(self)
    }

    /// Resolve the query.
    ///
    /// Either a result sequence (possibly empty) is returned, or a
    /// single error aborts the whole query; no partial results are ever
    /// exposed. A constraint whose candidate set is empty short-circuits
    /// to an empty result without evaluating the remaining constraints.
    pub fn execute(&self) -> Result<Vec<Relationship>> {
        let view = self.store.query_view();
        let type_id = self.kind.type_id.as_str();

        // Indexed constraints produce candidate sets up front; unindexed
        // attribute constraints are deferred to a filter pass over the
        // intersected candidates.
        let mut candidate_sets = Vec::new();
        let mut deferred: Vec<(&str, &AttributeValue)> = Vec::new();

        for constraint in &self.constraints {
            let set = match (&constraint.value, constraint.parameter.target()) {
                (QueryValue::Identity(id), ParameterTarget::Role) => {
                    Some(view.role_candidates(type_id, constraint.parameter.name(), id))
                }
                (QueryValue::Label(label), ParameterTarget::Name) => {
                    Some(view.name_candidates(type_id, label))
                }
                (QueryValue::Attribute(value), ParameterTarget::Attribute) => {
                    match view.attribute_candidates(type_id, constraint.parameter.name(), value) {
                        Some(set) => Some(set),
                        None => {
                            deferred.push((constraint.parameter.name(), value));
                            None
                        }
                    }
                }
                // set() enforced shape agreement already.
                _ => None,
            };

            if let Some(set) = set {
                if set.is_empty() {
                    debug!(
                        type_id = %type_id,
                        parameter = %constraint.parameter,
                        "query short-circuited on empty candidate set"
                    );
                    return Ok(Vec::new());
                }
                candidate_sets.push(set);
            }
        }

        // Smallest set first minimizes intersection comparisons. With no
        // indexed constraint the whole kind is the base set; documented
        // worst-case linear in the kind's population.
        candidate_sets.sort_by_key(|set| set.len());
        let mut iter = candidate_sets.into_iter();
        let mut result = match iter.next() {
            Some(first) => first,
            None => view.kind_candidates(type_id),
        };
        for set in iter {
            result = result.intersection(&set).copied().collect();
            if result.is_empty() {
                return Ok(Vec::new());
            }
        }

        for (attribute, value) in deferred {
            result = view.filter_by_attribute(result, attribute, value);
            if result.is_empty() {
                return Ok(Vec::new());
            }
        }

        let relationships = view.materialize(&result);
        debug!(
            type_id = %type_id,
            constraints = self.constraints.len(),
            matches = relationships.len(),
            "query executed"
        );
        Ok(relationships)
    }
}
