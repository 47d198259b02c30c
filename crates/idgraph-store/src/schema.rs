//! Relationship-kind schema registry.
//!
//! Kinds are registered once, before first use, and are immutable for the
//! process lifetime. The registry is the explicit, data-driven role table
//! the rest of the core consults; there is no runtime introspection of
//! relationship shapes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use idgraph_types::{Error, RelationshipKind, Result};
use tracing::debug;

use crate::lock;

/// Registry of relationship kinds keyed by `type_id`.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    kinds: RwLock<HashMap<String, Arc<RelationshipKind>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind. A relationship links two or more identities, so
    /// the kind must declare at least two roles
    /// ([`Error::UnderspecifiedKind`] otherwise); re-registering a
    /// `type_id` fails with [`Error::DuplicateKind`].
    pub fn register(&self, kind: RelationshipKind) -> Result<()> {
        if kind.roles.len() < 2 {
            return Err(Error::UnderspecifiedKind {
                kind: kind.type_id,
                given: kind.roles.len(),
            });
        }
        let mut kinds = lock::write(&self.kinds);
        if kinds.contains_key(&kind.type_id) {
            return Err(Error::DuplicateKind(kind.type_id));
        }
        debug!(type_id = %kind.type_id, roles = kind.roles.len(), "relationship kind registered");
        kinds.insert(kind.type_id.clone(), Arc::new(kind));
        Ok(())
    }

    /// Resolve a registered kind. Fails with [`Error::NotFound`] if the
    /// `type_id` is unknown.
    pub fn resolve(&self, type_id: &str) -> Result<Arc<RelationshipKind>> {
        lock::read(&self.kinds)
            .get(type_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("relationship kind '{type_id}'")))
    }

    /// Whether a kind with the given `type_id` has been registered.
    pub fn is_registered(&self, type_id: &str) -> bool {
        lock::read(&self.kinds).contains_key(type_id)
    }

    /// Resolve a kind for use by the store or a query.
    ///
    /// Unlike [`SchemaRegistry::resolve`], using an unregistered kind is
    /// reported as [`Error::SchemaNotReady`]: the caller attempted an
    /// operation that requires the schema to exist first.
    pub fn expect_registered(&self, type_id: &str) -> Result<Arc<RelationshipKind>> {
        lock::read(&self.kinds)
            .get(type_id)
            .cloned()
            .ok_or_else(|| Error::SchemaNotReady(type_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use idgraph_types::Cardinality;

    use super::*;

    fn authorization_kind() -> RelationshipKind {
        RelationshipKind::builder("authorization")
            .role("user", Cardinality::One)
            .role("application", Cardinality::One)
            .build()
    }

    #[test]
    fn test_register_then_resolve() {
        let registry = SchemaRegistry::new();
        registry.register(authorization_kind()).unwrap();

        let kind = registry.resolve("authorization").unwrap();
        assert!(kind.has_role("user"));
        assert!(registry.is_registered("authorization"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let registry = SchemaRegistry::new();
        registry.register(authorization_kind()).unwrap();

        let err = registry.register(authorization_kind()).unwrap_err();
        assert!(matches!(err, Error::DuplicateKind(id) if id == "authorization"));
    }

    #[test]
    fn test_register_rejects_fewer_than_two_roles() {
        let registry = SchemaRegistry::new();

        let err = registry
            .register(
                RelationshipKind::builder("solo")
                    .role("member", Cardinality::Many)
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnderspecifiedKind { given: 1, ref kind } if kind == "solo"
        ));

        let err = registry
            .register(RelationshipKind::builder("empty").build())
            .unwrap_err();
        assert!(matches!(err, Error::UnderspecifiedKind { given: 0, .. }));

        assert!(!registry.is_registered("solo"));
        assert!(!registry.is_registered("empty"));
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        let registry = SchemaRegistry::new();
        let err = registry.resolve("authorization").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_use_before_registration_is_schema_not_ready() {
        let registry = SchemaRegistry::new();
        let err = registry.expect_registered("authorization").unwrap_err();
        assert!(matches!(err, Error::SchemaNotReady(id) if id == "authorization"));
    }
}
