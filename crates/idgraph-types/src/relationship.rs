//! Relationship type
//!
//! A typed, attributed link between two or more identities, each occupying
//! a named role declared by the relationship's kind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attributes::AttributeMap;

/// Mapping from role name to the identity ids occupying that role.
///
/// Identities are referenced by id only; the registry owns them.
pub type RoleBindings = BTreeMap<String, Vec<String>>;

/// A relationship instance.
///
/// The id and `sequence` are assigned at creation and immutable;
/// `role_bindings` and `attributes` are mutable in place. Validation of
/// the bindings against the kind's schema happens in the store, never
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,

    /// The `type_id` of this relationship's registered kind.
    pub type_id: String,

    /// Optional human-readable label (e.g. "authorized").
    pub name: Option<String>,

    /// Identities bound per role.
    pub role_bindings: RoleBindings,

    /// Typed attributes attached to this relationship.
    pub attributes: AttributeMap,

    /// Process-wide creation sequence number. Query results are ordered
    /// ascending by this value, making repeated queries reproducible.
    pub sequence: u64,

    /// When this relationship was created.
    pub created_at: DateTime<Utc>,

    /// When this relationship was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// Create a new relationship with a freshly generated id.
    pub fn new(
        type_id: impl Into<String>,
        name: Option<String>,
        role_bindings: RoleBindings,
        attributes: AttributeMap,
        sequence: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            type_id: type_id.into(),
            name,
            role_bindings,
            attributes,
            sequence,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given identity occupies the given role.
    ///
    /// This is a membership predicate: on a Many-cardinality role the
    /// identity matches even when other identities occupy the role
    /// concurrently.
    pub fn occupies(&self, role: &str, identity_id: &str) -> bool {
        self.role_bindings
            .get(role)
            .map(|ids| ids.iter().any(|id| id == identity_id))
            .unwrap_or(false)
    }

    /// All identity ids referenced by any role of this relationship.
    pub fn referenced_identities(&self) -> impl Iterator<Item = &str> {
        self.role_bindings
            .values()
            .flat_map(|ids| ids.iter().map(String::as_str))
    }

    /// Record that the relationship was mutated.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Convenience for assembling role bindings.
pub fn bind_role(bindings: &mut RoleBindings, role: impl Into<String>, identity_id: impl Into<String>) {
    bindings.entry(role.into()).or_default().push(identity_id.into());
}
