//! Relationship kind schema
//!
//! A relationship kind declares, up front, the named roles its instances
//! bind and each role's cardinality. The role table is explicit data built
//! at registration time; there is no runtime introspection. `from` and
//! `to` are ordinary conventionally-named roles with no structural
//! significance.

use serde::{Deserialize, Serialize};

/// How many identities a role may bind concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one identity.
    One,
    /// One or more identities.
    Many,
}

/// A named slot in a relationship kind's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDescriptor {
    /// Role name, unique within the kind.
    pub name: String,

    /// How many identities the role accepts.
    pub cardinality: Cardinality,
}

/// A schema descriptor for one relationship kind.
///
/// Registered once per `type_id` before first use and immutable for the
/// process lifetime thereafter. Every declared role is required: a
/// relationship of this kind must bind each role to at least one existing
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipKind {
    /// Unique identifier for this kind (e.g. "authorization").
    pub type_id: String,

    /// The ordered set of declared roles.
    pub roles: Vec<RoleDescriptor>,
}

impl RelationshipKind {
    /// Start building a kind with the given type id.
    pub fn builder(type_id: impl Into<String>) -> KindBuilder {
        KindBuilder {
            type_id: type_id.into(),
            roles: Vec::new(),
        }
    }

    /// A conventional directed kind declaring the `from` and `to` roles,
    /// one identity each.
    pub fn directed(type_id: impl Into<String>) -> Self {
        Self::builder(type_id)
            .role("from", Cardinality::One)
            .role("to", Cardinality::One)
            .build()
    }

    /// Look up a declared role by name.
    pub fn role(&self, name: &str) -> Option<&RoleDescriptor> {
        self.roles.iter().find(|r| r.name == name)
    }

    /// Whether this kind declares a role with the given name.
    pub fn has_role(&self, name: &str) -> bool {
        self.role(name).is_some()
    }

    /// Names of all declared roles, in declaration order.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.name.as_str())
    }
}

/// Builder for [`RelationshipKind`].
#[derive(Debug, Clone)]
pub struct KindBuilder {
    type_id: String,
    roles: Vec<RoleDescriptor>,
}

impl KindBuilder {
    /// Declare a role. Re-declaring an existing name replaces its
    /// descriptor in place.
    pub fn role(mut self, name: impl Into<String>, cardinality: Cardinality) -> Self {
        let name = name.into();
        if let Some(existing) = self.roles.iter_mut().find(|r| r.name == name) {
            existing.cardinality = cardinality;
        } else {
            self.roles.push(RoleDescriptor { name, cardinality });
        }
        self
    }

    pub fn build(self) -> RelationshipKind {
        RelationshipKind {
            type_id: self.type_id,
            roles: self.roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_declares_roles_in_order() {
        let kind = RelationshipKind::builder("authorization")
            .role("user", Cardinality::One)
            .role("application", Cardinality::One)
            .build();
        assert_eq!(kind.type_id, "authorization");
        assert_eq!(
            kind.role_names().collect::<Vec<_>>(),
            vec!["user", "application"]
        );
    }

    #[test]
    fn test_redeclaring_a_role_replaces_cardinality() {
        let kind = RelationshipKind::builder("membership")
            .role("member", Cardinality::One)
            .role("member", Cardinality::Many)
            .build();
        assert_eq!(kind.roles.len(), 1);
        assert_eq!(kind.role("member").unwrap().cardinality, Cardinality::Many);
    }

    #[test]
    fn test_directed_kind_has_from_and_to() {
        let kind = RelationshipKind::directed("grant");
        assert!(kind.has_role("from"));
        assert!(kind.has_role("to"));
        assert_eq!(kind.role("from").unwrap().cardinality, Cardinality::One);
    }

    #[test]
    fn test_role_lookup_missing() {
        let kind = RelationshipKind::directed("grant");
        assert!(kind.role("user").is_none());
        assert!(!kind.has_role("user"));
    }
}
