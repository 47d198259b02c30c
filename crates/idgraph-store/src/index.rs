//! Index families maintained by the relationship store.
//!
//! Four maps keep queries off full scans:
//!
//! - role index: `(type_id, role, identity_id)` → sequence set
//! - name index: `(type_id, label)` → sequence set
//! - attribute index: `(type_id, attribute, value)` → sequence set, only
//!   for attribute names opted in via [`IndexOptions`]
//! - kind index: `type_id` → sequence set, backing zero-constraint queries
//!
//! A fifth map, the identity reference index, records which sequences
//! bind each identity in any role; the registry consults it when removing
//! identities.
//!
//! Sequence sets are `BTreeSet<u64>`, so iteration is already ascending
//! creation order. Each family sits behind its own lock; writers acquire
//! the families in a fixed order and hold them only for the duration of
//! the index update.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use idgraph_types::{AttributeValue, Relationship};

use crate::lock;

pub(crate) type SeqSet = BTreeSet<u64>;

type RoleKey = (String, String, String);
type NameKey = (String, String);
type AttributeKey = (String, String, AttributeValue);

/// Which attribute names are indexed, per kind.
///
/// Attribute indexing is opt-in to bound memory; constraints on unindexed
/// attributes fall back to a linear filter over the candidate set.
#[derive(Debug, Clone, Default)]
pub struct IndexOptions {
    indexed: HashSet<(String, String)>,
}

impl IndexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt an attribute name of a kind into eager indexing.
    pub fn index_attribute(mut self, type_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.indexed.insert((type_id.into(), attribute.into()));
        self
    }

    pub fn is_indexed(&self, type_id: &str, attribute: &str) -> bool {
        self.indexed
            .contains(&(type_id.to_string(), attribute.to_string()))
    }
}

#[derive(Debug)]
pub(crate) struct RelationshipIndexes {
    options: IndexOptions,
    kind: RwLock<HashMap<String, SeqSet>>,
    role: RwLock<HashMap<RoleKey, SeqSet>>,
    name: RwLock<HashMap<NameKey, SeqSet>>,
    attribute: RwLock<HashMap<AttributeKey, SeqSet>>,
    identity: RwLock<HashMap<String, SeqSet>>,
}

impl RelationshipIndexes {
    pub(crate) fn new(options: IndexOptions) -> Self {
        Self {
            options,
            kind: RwLock::default(),
            role: RwLock::default(),
            name: RwLock::default(),
            attribute: RwLock::default(),
            identity: RwLock::default(),
        }
    }

    /// Acquire read guards on every family, in lock order.
    pub(crate) fn read(&self) -> IndexReadView<'_> {
        IndexReadView {
            options: &self.options,
            kind: lock::read(&self.kind),
            role: lock::read(&self.role),
            name: lock::read(&self.name),
            attribute: lock::read(&self.attribute),
            identity: lock::read(&self.identity),
        }
    }

    /// Acquire write guards on every family, in lock order.
    pub(crate) fn write(&self) -> IndexWriteView<'_> {
        IndexWriteView {
            options: &self.options,
            kind: lock::write(&self.kind),
            role: lock::write(&self.role),
            name: lock::write(&self.name),
            attribute: lock::write(&self.attribute),
            identity: lock::write(&self.identity),
        }
    }
}

/// Consistent read view over all index families.
pub(crate) struct IndexReadView<'a> {
    options: &'a IndexOptions,
    kind: RwLockReadGuard<'a, HashMap<String, SeqSet>>,
    role: RwLockReadGuard<'a, HashMap<RoleKey, SeqSet>>,
    name: RwLockReadGuard<'a, HashMap<NameKey, SeqSet>>,
    attribute: RwLockReadGuard<'a, HashMap<AttributeKey, SeqSet>>,
    identity: RwLockReadGuard<'a, HashMap<String, SeqSet>>,
}

impl IndexReadView<'_> {
    pub(crate) fn kind_candidates(&self, type_id: &str) -> SeqSet {
        self.kind.get(type_id).cloned().unwrap_or_default()
    }

    pub(crate) fn role_candidates(&self, type_id: &str, role: &str, identity_id: &str) -> SeqSet {
        self.role
            .get(&(type_id.to_string(), role.to_string(), identity_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn name_candidates(&self, type_id: &str, label: &str) -> SeqSet {
        self.name
            .get(&(type_id.to_string(), label.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Candidates carrying the exact attribute value, or `None` when the
    /// attribute is not indexed for this kind and the caller must fall
    /// back to a linear filter.
    pub(crate) fn attribute_candidates(
        &self,
        type_id: &str,
        attribute: &str,
        value: &AttributeValue,
    ) -> Option<SeqSet> {
        if !self.options.is_indexed(type_id, attribute) {
            return None;
        }
        Some(
            self.attribute
                .get(&(type_id.to_string(), attribute.to_string(), value.clone()))
                .cloned()
                .unwrap_or_default(),
        )
    }

    pub(crate) fn referencing(&self, identity_id: &str) -> SeqSet {
        self.identity.get(identity_id).cloned().unwrap_or_default()
    }
}

/// Exclusive write view over all index families.
pub(crate) struct IndexWriteView<'a> {
    options: &'a IndexOptions,
    kind: RwLockWriteGuard<'a, HashMap<String, SeqSet>>,
    role: RwLockWriteGuard<'a, HashMap<RoleKey, SeqSet>>,
    name: RwLockWriteGuard<'a, HashMap<NameKey, SeqSet>>,
    attribute: RwLockWriteGuard<'a, HashMap<AttributeKey, SeqSet>>,
    identity: RwLockWriteGuard<'a, HashMap<String, SeqSet>>,
}

impl IndexWriteView<'_> {
    pub(crate) fn insert(&mut self, rel: &Relationship) {
        let seq = rel.sequence;
        self.kind.entry(rel.type_id.clone()).or_default().insert(seq);

        for (role, ids) in &rel.role_bindings {
            for id in ids {
                self.role
                    .entry((rel.type_id.clone(), role.clone(), id.clone()))
                    .or_default()
                    .insert(seq);
                self.identity.entry(id.clone()).or_default().insert(seq);
            }
        }

        if let Some(label) = &rel.name {
            self.name
                .entry((rel.type_id.clone(), label.clone()))
                .or_default()
                .insert(seq);
        }

        for (attr, value) in &rel.attributes {
            if self.options.is_indexed(&rel.type_id, attr) {
                self.attribute
                    .entry((rel.type_id.clone(), attr.clone(), value.clone()))
                    .or_default()
                    .insert(seq);
            }
        }
    }

    pub(crate) fn remove(&mut self, rel: &Relationship) {
        let seq = rel.sequence;
        Self::unindex(&mut self.kind, rel.type_id.clone(), seq);

        for (role, ids) in &rel.role_bindings {
            for id in ids {
                Self::unindex(
                    &mut self.role,
                    (rel.type_id.clone(), role.clone(), id.clone()),
                    seq,
                );
                Self::unindex(&mut self.identity, id.clone(), seq);
            }
        }

        if let Some(label) = &rel.name {
            Self::unindex(&mut self.name, (rel.type_id.clone(), label.clone()), seq);
        }

        for (attr, value) in &rel.attributes {
            if self.options.is_indexed(&rel.type_id, attr) {
                Self::unindex(
                    &mut self.attribute,
                    (rel.type_id.clone(), attr.clone(), value.clone()),
                    seq,
                );
            }
        }
    }

    pub(crate) fn referencing(&self, identity_id: &str) -> SeqSet {
        self.identity.get(identity_id).cloned().unwrap_or_default()
    }

    /// Drop a sequence from one bucket, removing the bucket when emptied.
    fn unindex<K: std::hash::Hash + Eq>(map: &mut HashMap<K, SeqSet>, key: K, seq: u64) {
        if let Some(set) = map.get_mut(&key) {
            set.remove(&seq);
            if set.is_empty() {
                map.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use idgraph_types::{bind_role, AttributeMap, RoleBindings};

    use super::*;

    fn rel(seq: u64, label: Option<&str>) -> Relationship {
        let mut bindings = RoleBindings::new();
        bind_role(&mut bindings, "user", "id-robert");
        bind_role(&mut bindings, "application", "id-app");
        let mut attrs = AttributeMap::new();
        attrs.set("accessToken", "at");
        Relationship::new(
            "authorization",
            label.map(str::to_string),
            bindings,
            attrs,
            seq,
        )
    }

    #[test]
    fn test_insert_populates_all_families() {
        let options = IndexOptions::new().index_attribute("authorization", "accessToken");
        let indexes = RelationshipIndexes::new(options);
        let r = rel(1, Some("authorized"));
        indexes.write().insert(&r);

        let view = indexes.read();
        assert!(view.kind_candidates("authorization").contains(&1));
        assert!(view
            .role_candidates("authorization", "user", "id-robert")
            .contains(&1));
        assert!(view
            .name_candidates("authorization", "authorized")
            .contains(&1));
        assert!(view
            .attribute_candidates("authorization", "accessToken", &AttributeValue::Text("at".into()))
            .unwrap()
            .contains(&1));
        assert!(view.referencing("id-app").contains(&1));
    }

    #[test]
    fn test_unindexed_attribute_reports_none() {
        let indexes = RelationshipIndexes::new(IndexOptions::new());
        let r = rel(1, None);
        indexes.write().insert(&r);

        let view = indexes.read();
        assert!(view
            .attribute_candidates("authorization", "accessToken", &AttributeValue::Text("at".into()))
            .is_none());
    }

    #[test]
    fn test_remove_clears_empty_buckets() {
        let options = IndexOptions::new().index_attribute("authorization", "accessToken");
        let indexes = RelationshipIndexes::new(options);
        let r = rel(1, Some("authorized"));
        {
            let mut w = indexes.write();
            w.insert(&r);
            w.remove(&r);
        }

        let view = indexes.read();
        assert!(view.kind_candidates("authorization").is_empty());
        assert!(view
            .role_candidates("authorization", "user", "id-robert")
            .is_empty());
        assert!(view.name_candidates("authorization", "authorized").is_empty());
        assert!(view.referencing("id-robert").is_empty());
    }

    #[test]
    fn test_sequences_iterate_ascending() {
        let indexes = RelationshipIndexes::new(IndexOptions::new());
        {
            let mut w = indexes.write();
            w.insert(&rel(3, None));
            w.insert(&rel(1, None));
            w.insert(&rel(2, None));
        }
        let seqs: Vec<u64> = indexes
            .read()
            .kind_candidates("authorization")
            .into_iter()
            .collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }
}
