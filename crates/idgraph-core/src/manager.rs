//! The identity/relationship facade.
//!
//! [`IdentityManager`] is the single entry point external callers use:
//! it composes the schema registry, the identity registry, the
//! relationship store, and the query engine behind one surface.

use idgraph_config::Config;
use idgraph_store::{GraphStore, IndexOptions, MemoryBackend, PersistenceBackend};
use idgraph_types::{
    AttributeMap, AttributeValue, Identity, IdentityKind, Relationship, RelationshipKind, Result,
    RoleBindings,
};
use tracing::info;

use crate::query::QueryBuilder;

/// Facade over the identity/relationship core.
pub struct IdentityManager<B: PersistenceBackend> {
    store: GraphStore<B>,
}

impl IdentityManager<MemoryBackend> {
    /// A manager over the in-memory backend with no indexed attributes.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: PersistenceBackend> IdentityManager<B> {
    /// Create a manager over the given persistence collaborator.
    pub fn new(backend: B) -> Self {
        Self {
            store: GraphStore::new(backend),
        }
    }

    /// Create a manager with attribute-indexing opt-ins.
    pub fn with_options(backend: B, options: IndexOptions) -> Self {
        Self {
            store: GraphStore::with_options(backend, options),
        }
    }

    /// Create a manager wired from configuration: the config's
    /// `store.indexed_attributes` entries become index opt-ins.
    pub fn from_config(backend: B, config: &Config) -> Self {
        let mut options = IndexOptions::new();
        for entry in &config.store.indexed_attributes {
            options = options.index_attribute(entry.kind.clone(), entry.attribute.clone());
        }
        info!(
            backend = %config.store.backend,
            indexed_attributes = config.store.indexed_attributes.len(),
            "identity manager configured"
        );
        Self::with_options(backend, options)
    }

    /// The underlying store. Exposed for diagnostics and tests.
    pub fn store(&self) -> &GraphStore<B> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------

    /// Register a relationship kind; must happen before any relationship
    /// of the kind, or query over it, is used.
    pub fn register_kind(&self, kind: RelationshipKind) -> Result<()> {
        self.store.schema().register(kind)
    }

    /// Resolve a registered kind by `type_id`.
    pub fn resolve_kind(&self, type_id: &str) -> Result<RelationshipKind> {
        self.store.schema().resolve(type_id).map(|k| (*k).clone())
    }

    // ------------------------------------------------------------------
    // Identities
    // ------------------------------------------------------------------

    pub fn create_identity(
        &self,
        kind: IdentityKind,
        attributes: AttributeMap,
    ) -> Result<Identity> {
        self.store.create_identity(kind, attributes)
    }

    pub fn get_identity(&self, id: &str) -> Result<Identity> {
        self.store.get_identity(id)
    }

    pub fn update_identity<F>(&self, id: &str, mutator: F) -> Result<Identity>
    where
        F: FnOnce(&mut Identity),
    {
        self.store.update_identity(id, mutator)
    }

    /// Remove an identity; fails with `ReferencedByRelationship` while
    /// relationships bind it, unless `cascade` also removes those.
    pub fn remove_identity(&self, id: &str, cascade: bool) -> Result<()> {
        self.store.remove_identity(id, cascade)
    }

    /// Mark an identity disabled without removing it.
    pub fn disable_identity(&self, id: &str) -> Result<Identity> {
        self.store.update_identity(id, |i| i.enabled = false)
    }

    /// Re-enable a disabled identity.
    pub fn enable_identity(&self, id: &str) -> Result<Identity> {
        self.store.update_identity(id, |i| i.enabled = true)
    }

    pub fn set_identity_attribute(
        &self,
        id: &str,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        let name = name.into();
        let value = value.into();
        self.store
            .update_identity(id, move |i| {
                i.attributes.set(name, value);
            })
            .map(|_| ())
    }

    pub fn get_identity_attribute(&self, id: &str, name: &str) -> Result<Option<AttributeValue>> {
        Ok(self.store.get_identity(id)?.attributes.get(name).cloned())
    }

    /// Remove an attribute from an identity; `Ok(false)` if it was
    /// absent.
    pub fn remove_identity_attribute(&self, id: &str, name: &str) -> Result<bool> {
        let mut removed = false;
        self.store.update_identity(id, |i| {
            removed = i.attributes.remove(name);
        })?;
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------

    pub fn add_relationship(
        &self,
        type_id: &str,
        role_bindings: RoleBindings,
        name: Option<String>,
        attributes: AttributeMap,
    ) -> Result<Relationship> {
        self.store
            .add_relationship(type_id, role_bindings, name, attributes)
    }

    pub fn get_relationship(&self, id: &str) -> Result<Relationship> {
        self.store.get_relationship(id)
    }

    pub fn update_relationship<F>(&self, id: &str, mutator: F) -> Result<Relationship>
    where
        F: FnOnce(&mut Relationship),
    {
        self.store.update_relationship(id, mutator)
    }

    pub fn remove_relationship(&self, id: &str) -> Result<()> {
        self.store.remove_relationship(id)
    }

    pub fn set_relationship_attribute(
        &self,
        id: &str,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        let name = name.into();
        let value = value.into();
        self.store
            .update_relationship(id, move |r| {
                r.attributes.set(name, value);
            })
            .map(|_| ())
    }

    pub fn get_relationship_attribute(
        &self,
        id: &str,
        name: &str,
    ) -> Result<Option<AttributeValue>> {
        Ok(self
            .store
            .get_relationship(id)?
            .attributes
            .get(name)
            .cloned())
    }

    /// Remove an attribute from a relationship; `Ok(false)` if it was
    /// absent.
    pub fn remove_relationship_attribute(&self, id: &str, name: &str) -> Result<bool> {
        let mut removed = false;
        self.store.update_relationship(id, |r| {
            removed = r.attributes.remove(name);
        })?;
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Start a query over relationships of the given kind. Fails with
    /// `SchemaNotReady` when the kind is not registered.
    pub fn new_query(&self, type_id: &str) -> Result<QueryBuilder<'_, B>> {
        let kind = self.store.resolve_kind_for_query(type_id)?;
        Ok(QueryBuilder::new(&self.store, kind))
    }
}
