//! The graph store: identity registry plus relationship store.
//!
//! One structure owns both entity families because their invariants are
//! entangled: relationships reference identities by id, and identity
//! removal must observe (or cascade over) those references atomically.
//!
//! # Locking
//!
//! Shared state is guarded by reader/writer locks acquired in a fixed
//! order: identity table, then relationship table, then index families.
//! Writers lock only the structures they touch; index write guards are
//! held just for the index update. Queries read through [`QueryView`],
//! which holds the relationship-table and index read guards together so a
//! single execution sees one consistent state.
//!
//! # Persistence
//!
//! The injected [`PersistenceBackend`] is called inside the write's
//! critical section, before the in-memory commit. A backend failure
//! therefore aborts the write with [`Error::PersistenceFailure`] and
//! leaves the in-memory state untouched.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use idgraph_types::{
    AttributeMap, AttributeValue, Cardinality, Error, Identity, IdentityKind, Relationship,
    RelationshipKind, Result, RoleBindings,
};
use tracing::{debug, info};

use crate::index::{IndexOptions, IndexReadView, RelationshipIndexes, SeqSet};
use crate::lock;
use crate::schema::SchemaRegistry;
use crate::PersistenceBackend;

#[derive(Debug, Default)]
struct RelationshipTable {
    by_seq: BTreeMap<u64, Relationship>,
    by_id: HashMap<String, u64>,
    next_seq: u64,
}

impl RelationshipTable {
    fn seq_of(&self, id: &str) -> Result<u64> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("relationship '{id}'")))
    }

    fn insert(&mut self, rel: Relationship) {
        self.by_id.insert(rel.id.clone(), rel.sequence);
        self.by_seq.insert(rel.sequence, rel);
    }

    fn remove(&mut self, seq: u64) -> Option<Relationship> {
        let rel = self.by_seq.remove(&seq)?;
        self.by_id.remove(&rel.id);
        Some(rel)
    }
}

/// The shared mutable store of identities and relationships.
pub struct GraphStore<B: PersistenceBackend> {
    schema: SchemaRegistry,
    identities: RwLock<HashMap<String, Identity>>,
    table: RwLock<RelationshipTable>,
    indexes: RelationshipIndexes,
    backend: B,
}

impl<B: PersistenceBackend> GraphStore<B> {
    /// Create a store over the given backend with no indexed attributes.
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, IndexOptions::new())
    }

    /// Create a store with attribute-indexing opt-ins.
    pub fn with_options(backend: B, options: IndexOptions) -> Self {
        Self {
            schema: SchemaRegistry::new(),
            identities: RwLock::default(),
            table: RwLock::default(),
            indexes: RelationshipIndexes::new(options),
            backend,
        }
    }

    /// The kind registry. Kinds must be registered here before any
    /// relationship of that kind, or query over it, is used.
    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// The persistence collaborator.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ------------------------------------------------------------------
    // Identity registry
    // ------------------------------------------------------------------

    /// Create an identity. The id is generated here and is unique for
    /// the registry's lifetime.
    pub fn create_identity(
        &self,
        kind: IdentityKind,
        attributes: AttributeMap,
    ) -> Result<Identity> {
        let identity = Identity::new(kind, attributes);
        let mut identities = lock::write(&self.identities);
        self.backend.persist_identity(&identity)?;
        identities.insert(identity.id.clone(), identity.clone());
        debug!(id = %identity.id, kind = %identity.kind, "identity created");
        Ok(identity)
    }

    /// Fetch an identity by id.
    pub fn get_identity(&self, id: &str) -> Result<Identity> {
        lock::read(&self.identities)
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("identity '{id}'")))
    }

    /// All identities, ordered by id. Diagnostic surface.
    pub fn list_identities(&self) -> Vec<Identity> {
        let identities = lock::read(&self.identities);
        let mut all: Vec<Identity> = identities.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Apply a mutator to an identity. The id is immutable; a mutator
    /// that rewrites it is overridden before commit.
    pub fn update_identity<F>(&self, id: &str, mutator: F) -> Result<Identity>
    where
        F: FnOnce(&mut Identity),
    {
        let mut identities = lock::write(&self.identities);
        let current = identities
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("identity '{id}'")))?;

        let mut updated = current.clone();
        mutator(&mut updated);
        updated.id = current.id.clone();
        updated.created_at = current.created_at;
        updated.touch();

        self.backend.persist_identity(&updated)?;
        identities.insert(id.to_string(), updated.clone());
        debug!(id = %id, "identity updated");
        Ok(updated)
    }

    /// Remove an identity.
    ///
    /// Without `cascade`, fails with [`Error::ReferencedByRelationship`]
    /// if any relationship binds the identity in any role. With
    /// `cascade`, all referencing relationships are removed together with
    /// the identity; the whole cascade happens under the identity table's
    /// write lock, so no query observes the intermediate state.
    pub fn remove_identity(&self, id: &str, cascade: bool) -> Result<()> {
        let mut identities = lock::write(&self.identities);
        if !identities.contains_key(id) {
            return Err(Error::NotFound(format!("identity '{id}'")));
        }

        let mut table = lock::write(&self.table);
        let mut indexes = self.indexes.write();

        let referencing: SeqSet = indexes.referencing(id);
        if !referencing.is_empty() && !cascade {
            return Err(Error::ReferencedByRelationship {
                identity: id.to_string(),
                count: referencing.len(),
            });
        }

        let to_remove: Vec<Relationship> = referencing
            .iter()
            .filter_map(|seq| table.by_seq.get(seq).cloned())
            .collect();

        // Backend first: memory stays untouched if any collaborator call
        // fails mid-cascade.
        for rel in &to_remove {
            self.backend.delete_relationship(&rel.id)?;
        }
        self.backend.delete_identity(id)?;

        for rel in &to_remove {
            indexes.remove(rel);
            table.remove(rel.sequence);
        }
        identities.remove(id);

        info!(
            id = %id,
            cascaded = to_remove.len(),
            "identity removed"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Relationship store
    // ------------------------------------------------------------------

    /// Add a relationship of a registered kind.
    ///
    /// Validates the bindings against the kind's schema (`MissingRole`,
    /// `CardinalityViolation`, `SchemaMismatch` for an undeclared role)
    /// and every bound identity against the registry (`NotFound` on a
    /// dangling reference), then assigns an id and indexes the instance.
    pub fn add_relationship(
        &self,
        type_id: &str,
        role_bindings: RoleBindings,
        name: Option<String>,
        attributes: AttributeMap,
    ) -> Result<Relationship> {
        let kind = self.schema.expect_registered(type_id)?;
        validate_bindings(&kind, &role_bindings)?;

        let identities = lock::read(&self.identities);
        check_references(&identities, &role_bindings)?;

        let mut table = lock::write(&self.table);
        let sequence = table.next_seq;
        let rel = Relationship::new(type_id, name, role_bindings, attributes, sequence);

        self.backend.persist_relationship(&rel)?;
        table.next_seq += 1;
        table.insert(rel.clone());
        self.indexes.write().insert(&rel);

        debug!(
            id = %rel.id,
            type_id = %type_id,
            sequence = sequence,
            "relationship added"
        );
        Ok(rel)
    }

    /// Fetch a relationship by id.
    pub fn get_relationship(&self, id: &str) -> Result<Relationship> {
        let table = lock::read(&self.table);
        let seq = table.seq_of(id)?;
        Ok(table.by_seq[&seq].clone())
    }

    /// Apply a mutator to a relationship, then re-validate the role and
    /// attribute invariants. Identity references introduced by the
    /// mutator must resolve. The id, kind, and sequence are immutable.
    pub fn update_relationship<F>(&self, id: &str, mutator: F) -> Result<Relationship>
    where
        F: FnOnce(&mut Relationship),
    {
        let identities = lock::read(&self.identities);
        let mut table = lock::write(&self.table);
        let seq = table.seq_of(id)?;
        let current = &table.by_seq[&seq];

        let mut updated = current.clone();
        mutator(&mut updated);
        updated.id = current.id.clone();
        updated.type_id = current.type_id.clone();
        updated.sequence = current.sequence;
        updated.created_at = current.created_at;

        let kind = self.schema.expect_registered(&updated.type_id)?;
        validate_bindings(&kind, &updated.role_bindings)?;
        check_references(&identities, &updated.role_bindings)?;
        updated.touch();

        self.backend.persist_relationship(&updated)?;
        let old = table
            .by_seq
            .insert(seq, updated.clone())
            .unwrap_or_else(|| updated.clone());
        let mut indexes = self.indexes.write();
        indexes.remove(&old);
        indexes.insert(&updated);

        debug!(id = %id, "relationship updated");
        Ok(updated)
    }

    /// Remove a relationship, deindexing it.
    pub fn remove_relationship(&self, id: &str) -> Result<()> {
        let mut table = lock::write(&self.table);
        let seq = table.seq_of(id)?;
        let rel = table.by_seq[&seq].clone();

        self.backend.delete_relationship(id)?;
        table.remove(seq);
        self.indexes.write().remove(&rel);

        debug!(id = %id, "relationship removed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query support
    // ------------------------------------------------------------------

    /// Resolve a kind for a query; an unregistered kind is
    /// [`Error::SchemaNotReady`].
    pub fn resolve_kind_for_query(&self, type_id: &str) -> Result<Arc<RelationshipKind>> {
        self.schema.expect_registered(type_id)
    }

    /// Open a consistent read view for one query execution.
    pub fn query_view(&self) -> QueryView<'_> {
        QueryView {
            table: lock::read(&self.table),
            indexes: self.indexes.read(),
        }
    }
}

/// A consistent snapshot of the relationship table and the index
/// families, held for the duration of one query execution. Concurrent
/// readers share it; writers wait.
pub struct QueryView<'a> {
    table: RwLockReadGuard<'a, RelationshipTable>,
    indexes: IndexReadView<'a>,
}

impl QueryView<'_> {
    /// Sequences where `identity_id` occupies `role`.
    pub fn role_candidates(&self, type_id: &str, role: &str, identity_id: &str) -> SeqSet {
        self.indexes.role_candidates(type_id, role, identity_id)
    }

    /// Sequences labelled `label`.
    pub fn name_candidates(&self, type_id: &str, label: &str) -> SeqSet {
        self.indexes.name_candidates(type_id, label)
    }

    /// Sequences carrying the exact attribute value, or `None` when the
    /// attribute is unindexed and the caller must filter linearly.
    pub fn attribute_candidates(
        &self,
        type_id: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> Option<SeqSet> {
        self.indexes.attribute_candidates(type_id, attribute, value)
    }

    /// All sequences of a kind, ascending. The base set for a query with
    /// no indexed constraints; worst-case linear in the kind's
    /// population.
    pub fn kind_candidates(&self, type_id: &str) -> SeqSet {
        self.indexes.kind_candidates(type_id)
    }

    /// Linear filter pass: keep candidates whose stored relationship
    /// carries the exact attribute value.
    pub fn filter_by_attribute(
        &self,
        candidates: SeqSet,
        attribute: &str,
        value: &AttributeValue,
    ) -> SeqSet {
        candidates
            .into_iter()
            .filter(|seq| {
                self.table
                    .by_seq
                    .get(seq)
                    .map(|rel| rel.attributes.get(attribute) == Some(value))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Materialize candidates in ascending creation order.
    pub fn materialize(&self, candidates: &SeqSet) -> Vec<Relationship> {
        candidates
            .iter()
            .filter_map(|seq| self.table.by_seq.get(seq).cloned())
            .collect()
    }
}

/// Validate role bindings against a kind's schema.
///
/// Every declared role is required; binding an undeclared role is a
/// schema mismatch; a One-role bound to more than one identity is a
/// cardinality violation.
fn validate_bindings(kind: &RelationshipKind, bindings: &RoleBindings) -> Result<()> {
    for role in &kind.roles {
        let bound = bindings.get(&role.name).map(Vec::as_slice).unwrap_or(&[]);
        if bound.is_empty() {
            return Err(Error::MissingRole {
                role: role.name.clone(),
                kind: kind.type_id.clone(),
            });
        }
        if role.cardinality == Cardinality::One && bound.len() > 1 {
            return Err(Error::CardinalityViolation {
                role: role.name.clone(),
                kind: kind.type_id.clone(),
                given: bound.len(),
            });
        }
    }
    for bound_role in bindings.keys() {
        if !kind.has_role(bound_role) {
            return Err(Error::SchemaMismatch {
                parameter: bound_role.clone(),
                kind: kind.type_id.clone(),
            });
        }
    }
    Ok(())
}

/// Every bound identity id must resolve in the registry.
fn check_references(
    identities: &HashMap<String, Identity>,
    bindings: &RoleBindings,
) -> Result<()> {
    for ids in bindings.values() {
        for id in ids {
            if !identities.contains_key(id) {
                return Err(Error::NotFound(format!("identity '{id}'")));
            }
        }
    }
    Ok(())
}
