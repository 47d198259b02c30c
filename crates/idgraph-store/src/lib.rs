//! # Idgraph Store - Identity and Relationship Storage
//!
//! Provides the persistence-collaborator boundary, the schema registry,
//! and the in-memory graph store with its index families. All operations
//! are synchronous request/response; the store never blocks on external
//! I/O beyond the injected [`PersistenceBackend`].

use idgraph_types::{Identity, Relationship, Result};

mod index;
pub mod memory;
pub mod schema;
mod store;

pub use index::IndexOptions;
pub use memory::MemoryBackend;
pub use schema::SchemaRegistry;
pub use store::{GraphStore, QueryView};

/// The injected persistence collaborator.
///
/// The core is agnostic to the backend's format; it only requires that
/// these calls are synchronous and report success or failure
/// unambiguously. Implementations surface failures as
/// [`idgraph_types::Error::PersistenceFailure`]. A failed call during a
/// write aborts the write before any in-memory mutation is applied, so
/// the store never diverges from what a failed write is reported to have
/// done.
pub trait PersistenceBackend: Send + Sync {
    fn persist_identity(&self, identity: &Identity) -> Result<()>;
    fn load_identity(&self, id: &str) -> Result<Option<Identity>>;
    fn delete_identity(&self, id: &str) -> Result<()>;

    fn persist_relationship(&self, relationship: &Relationship) -> Result<()>;
    fn load_relationship(&self, id: &str) -> Result<Option<Relationship>>;
    fn delete_relationship(&self, id: &str) -> Result<()>;
}

/// Poison-recovering lock helpers.
///
/// A poisoned lock means a writer panicked; the guarded data is still
/// structurally valid for this store's maps, so readers recover the
/// guard instead of propagating the panic.
pub(crate) mod lock {
    use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

    pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
        lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
        lock.write().unwrap_or_else(PoisonError::into_inner)
    }
}
