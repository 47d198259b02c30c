//! # Idgraph Types
//!
//! Shared type definitions for the idgraph identity/relationship core.
//!
//! This crate provides all domain types used across the idgraph workspace,
//! ensuring a single source of truth and preventing circular dependencies:
//! identities, attribute values, relationship kinds and instances, query
//! parameters, and the error enum.

mod attributes;
mod error;
mod identity;
mod query;
mod relationship;
mod schema;

pub use attributes::{AttributeMap, AttributeValue};
pub use error::{Error, Result};
pub use identity::{Identity, IdentityKind};
pub use query::{ParameterTarget, QueryParameter, QueryValue, FROM, NAME, TO};
pub use relationship::{bind_role, Relationship, RoleBindings};
pub use schema::{Cardinality, KindBuilder, RelationshipKind, RoleDescriptor};
