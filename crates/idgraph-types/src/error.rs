//! Error types shared across the idgraph workspace.
//!
//! Every fallible operation in the core reports one of these variants
//! synchronously; nothing is swallowed or deferred.

use thiserror::Error;

/// Result type alias for idgraph operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the identity/relationship core.
#[derive(Debug, Error)]
pub enum Error {
    /// An identity, relationship, or kind id did not resolve.
    #[error("not found: {0}")]
    NotFound(String),

    /// A relationship kind with the same type id is already registered.
    #[error("relationship kind already registered: {0}")]
    DuplicateKind(String),

    /// A relationship kind declares fewer roles than a relationship can
    /// link.
    #[error("relationship kind '{kind}' declares {given} role(s), at least 2 required")]
    UnderspecifiedKind { kind: String, given: usize },

    /// A relationship kind was used before being registered.
    #[error("relationship kind not registered: {0}")]
    SchemaNotReady(String),

    /// A query parameter or role binding does not belong to the kind in use.
    #[error("parameter '{parameter}' does not apply to relationship kind '{kind}'")]
    SchemaMismatch { parameter: String, kind: String },

    /// A required role of the relationship's kind was left unbound.
    #[error("required role '{role}' of kind '{kind}' is unbound")]
    MissingRole { role: String, kind: String },

    /// A One-cardinality role was bound to more than one identity.
    #[error("role '{role}' of kind '{kind}' accepts one identity, {given} given")]
    CardinalityViolation { role: String, kind: String, given: usize },

    /// An attribute was read with a caller-expected type that does not
    /// match the stored value's type.
    #[error("attribute '{name}' holds a {actual} value, {expected} requested")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A non-cascading identity removal was blocked by live relationships.
    #[error("identity '{identity}' is bound by {count} relationship(s)")]
    ReferencedByRelationship { identity: String, count: usize },

    /// The persistence collaborator failed; the in-memory mutation was
    /// not applied.
    #[error("persistence backend failed: {0}")]
    PersistenceFailure(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::PersistenceFailure(err.to_string())
    }
}
