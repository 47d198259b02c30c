//! Identity type
//!
//! Represents an addressable principal (agent, user, group) participating
//! in relationships.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attributes::AttributeMap;

/// The kind of principal an identity represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityKind {
    /// A non-human principal such as an OAuth application or a service.
    Agent,
    /// A human principal.
    User,
    /// A named collection of principals.
    Group,
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityKind::Agent => write!(f, "agent"),
            IdentityKind::User => write!(f, "user"),
            IdentityKind::Group => write!(f, "group"),
        }
    }
}

/// An addressable principal.
///
/// The id is assigned at creation and immutable; `enabled` and the
/// attribute bag are mutable in place. Identities are destroyed only by
/// explicit removal through the registry, which also guards the
/// relationships that reference them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque unique identifier, assigned at creation.
    pub id: String,

    /// What kind of principal this is.
    pub kind: IdentityKind,

    /// Whether the identity is currently enabled.
    pub enabled: bool,

    /// Typed attributes attached to this identity.
    pub attributes: AttributeMap,

    /// When this identity was created.
    pub created_at: DateTime<Utc>,

    /// When this identity was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Create a new enabled identity with a freshly generated id.
    pub fn new(kind: IdentityKind, attributes: AttributeMap) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            enabled: true,
            attributes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record that the identity was mutated.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
