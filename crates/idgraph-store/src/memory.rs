//! In-memory persistence backend for testing and development.
//!
//! Entities are stored JSON-serialized, the same shape a durable backend
//! would receive, so serialization failures surface here rather than only
//! against a real database.

use std::collections::HashMap;
use std::sync::RwLock;

use idgraph_types::{Error, Identity, Relationship, Result};

use crate::lock;
use crate::PersistenceBackend;

/// A [`PersistenceBackend`] holding serialized entities in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    identities: RwLock<HashMap<String, Vec<u8>>>,
    relationships: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities currently persisted.
    pub fn identity_count(&self) -> usize {
        lock::read(&self.identities).len()
    }

    /// Number of relationships currently persisted.
    pub fn relationship_count(&self) -> usize {
        lock::read(&self.relationships).len()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn persist_identity(&self, identity: &Identity) -> Result<()> {
        let data = serde_json::to_vec(identity)?;
        lock::write(&self.identities).insert(identity.id.clone(), data);
        Ok(())
    }

    fn load_identity(&self, id: &str) -> Result<Option<Identity>> {
        match lock::read(&self.identities).get(id) {
            Some(data) => {
                let identity = serde_json::from_slice(data)
                    .map_err(|e| Error::PersistenceFailure(e.to_string()))?;
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }

    fn delete_identity(&self, id: &str) -> Result<()> {
        lock::write(&self.identities).remove(id);
        Ok(())
    }

    fn persist_relationship(&self, relationship: &Relationship) -> Result<()> {
        let data = serde_json::to_vec(relationship)?;
        lock::write(&self.relationships).insert(relationship.id.clone(), data);
        Ok(())
    }

    fn load_relationship(&self, id: &str) -> Result<Option<Relationship>> {
        match lock::read(&self.relationships).get(id) {
            Some(data) => {
                let relationship = serde_json::from_slice(data)
                    .map_err(|e| Error::PersistenceFailure(e.to_string()))?;
                Ok(Some(relationship))
            }
            None => Ok(None),
        }
    }

    fn delete_relationship(&self, id: &str) -> Result<()> {
        lock::write(&self.relationships).remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use idgraph_types::{AttributeMap, IdentityKind};

    use super::*;

    #[test]
    fn test_identity_round_trip() {
        let backend = MemoryBackend::new();
        let mut attrs = AttributeMap::new();
        attrs.set("username", "robert");
        let identity = Identity::new(IdentityKind::User, attrs);

        backend.persist_identity(&identity).unwrap();
        let loaded = backend.load_identity(&identity.id).unwrap().unwrap();
        assert_eq!(identity, loaded);
        assert_eq!(backend.identity_count(), 1);
    }

    #[test]
    fn test_load_missing_is_none() {
        let backend = MemoryBackend::new();
        assert!(backend.load_identity("missing").unwrap().is_none());
        assert!(backend.load_relationship("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let backend = MemoryBackend::new();
        let identity = Identity::new(IdentityKind::Agent, AttributeMap::new());
        backend.persist_identity(&identity).unwrap();

        backend.delete_identity(&identity.id).unwrap();
        assert!(backend.load_identity(&identity.id).unwrap().is_none());
        // Deleting again is not an error.
        backend.delete_identity(&identity.id).unwrap();
    }

    #[test]
    fn test_persist_overwrites() {
        let backend = MemoryBackend::new();
        let mut identity = Identity::new(IdentityKind::User, AttributeMap::new());
        backend.persist_identity(&identity).unwrap();

        identity.enabled = false;
        backend.persist_identity(&identity).unwrap();

        let loaded = backend.load_identity(&identity.id).unwrap().unwrap();
        assert!(!loaded.enabled);
        assert_eq!(backend.identity_count(), 1);
    }
}
