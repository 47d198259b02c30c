//! Property tests: every index family must agree with a linear scan of
//! the stored relationships, across arbitrary add/remove interleavings.

use proptest::prelude::*;

use idgraph_store::{GraphStore, IndexOptions, MemoryBackend};
use idgraph_types::{
    bind_role, AttributeMap, AttributeValue, Cardinality, IdentityKind, Relationship,
    RelationshipKind, RoleBindings,
};

const LABELS: &[&str] = &["authorized", "pending", "revoked"];
const TOKENS: &[&str] = &["at-0", "at-1", "at-2"];

/// One relationship to create: pool indexes into users/apps/labels, plus
/// an optional indexed accessToken value.
#[derive(Debug, Clone)]
struct Grant {
    user: usize,
    app: usize,
    label: usize,
    token: Option<usize>,
}

fn grant_strategy() -> impl Strategy<Value = Grant> {
    (0..3usize, 0..3usize, 0..3usize, proptest::option::of(0..3usize)).prop_map(
        |(user, app, label, token)| Grant {
            user,
            app,
            label,
            token,
        },
    )
}

fn build_store(
    grants: &[Grant],
    remove_every: usize,
) -> (GraphStore<MemoryBackend>, Vec<String>, Vec<String>) {
    let options = IndexOptions::new().index_attribute("authorization", "accessToken");
    let store = GraphStore::with_options(MemoryBackend::new(), options);
    store
        .schema()
        .register(
            RelationshipKind::builder("authorization")
                .role("user", Cardinality::One)
                .role("application", Cardinality::One)
                .build(),
        )
        .unwrap();

    let users: Vec<String> = (0..3)
        .map(|_| {
            store
                .create_identity(IdentityKind::User, AttributeMap::new())
                .unwrap()
                .id
        })
        .collect();
    let apps: Vec<String> = (0..3)
        .map(|_| {
            store
                .create_identity(IdentityKind::Agent, AttributeMap::new())
                .unwrap()
                .id
        })
        .collect();

    let mut created = Vec::new();
    for grant in grants {
        let mut bindings = RoleBindings::new();
        bind_role(&mut bindings, "user", &users[grant.user]);
        bind_role(&mut bindings, "application", &apps[grant.app]);
        let mut attrs = AttributeMap::new();
        if let Some(token) = grant.token {
            attrs.set("accessToken", TOKENS[token]);
        }
        let rel = store
            .add_relationship(
                "authorization",
                bindings,
                Some(LABELS[grant.label].to_string()),
                attrs,
            )
            .unwrap();
        created.push(rel.id);
    }

    if remove_every > 0 {
        for id in created.iter().step_by(remove_every) {
            store.remove_relationship(id).unwrap();
        }
    }

    (store, users, apps)
}

fn surviving(store: &GraphStore<MemoryBackend>) -> Vec<Relationship> {
    let view = store.query_view();
    let all = view.kind_candidates("authorization");
    view.materialize(&all)
}

proptest! {
    #[test]
    fn prop_name_index_agrees_with_linear_scan(
        grants in proptest::collection::vec(grant_strategy(), 0..24),
        remove_every in 0..4usize,
    ) {
        let (store, _, _) = build_store(&grants, remove_every);
        let all = surviving(&store);
        let view = store.query_view();

        for label in LABELS {
            let candidates = view.name_candidates("authorization", label);
            let scanned: Vec<u64> = all
                .iter()
                .filter(|r| r.name.as_deref() == Some(*label))
                .map(|r| r.sequence)
                .collect();
            prop_assert_eq!(
                candidates.iter().copied().collect::<Vec<_>>(),
                scanned
            );
        }
    }

    #[test]
    fn prop_role_index_agrees_with_linear_scan(
        grants in proptest::collection::vec(grant_strategy(), 0..24),
        remove_every in 0..4usize,
    ) {
        let (store, users, apps) = build_store(&grants, remove_every);
        let all = surviving(&store);
        let view = store.query_view();

        for (role, pool) in [("user", &users), ("application", &apps)] {
            for id in pool {
                let candidates = view.role_candidates("authorization", role, id);
                let scanned: Vec<u64> = all
                    .iter()
                    .filter(|r| r.occupies(role, id))
                    .map(|r| r.sequence)
                    .collect();
                prop_assert_eq!(
                    candidates.iter().copied().collect::<Vec<_>>(),
                    scanned
                );
            }
        }
    }

    #[test]
    fn prop_attribute_index_agrees_with_linear_scan(
        grants in proptest::collection::vec(grant_strategy(), 0..24),
        remove_every in 0..4usize,
    ) {
        let (store, _, _) = build_store(&grants, remove_every);
        let all = surviving(&store);
        let view = store.query_view();

        for token in TOKENS {
            let value = AttributeValue::Text(token.to_string());
            let candidates = view
                .attribute_candidates("authorization", "accessToken", &value)
                .expect("accessToken is indexed");
            let scanned: Vec<u64> = all
                .iter()
                .filter(|r| r.attributes.get("accessToken") == Some(&value))
                .map(|r| r.sequence)
                .collect();
            prop_assert_eq!(
                candidates.iter().copied().collect::<Vec<_>>(),
                scanned
            );
        }
    }

    #[test]
    fn prop_identity_reference_index_agrees_with_occupancy(
        grants in proptest::collection::vec(grant_strategy(), 0..24),
        remove_every in 0..4usize,
    ) {
        let (store, users, apps) = build_store(&grants, remove_every);
        let all = surviving(&store);

        for id in users.iter().chain(apps.iter()) {
            let referenced = all
                .iter()
                .any(|r| r.referenced_identities().any(|i| i == id.as_str()));
            // A referenced identity cannot be removed without cascade; an
            // unreferenced one can.
            let result = store.remove_identity(id, false);
            if referenced {
                prop_assert!(result.is_err());
                prop_assert!(store.get_identity(id).is_ok());
            } else {
                prop_assert!(result.is_ok());
            }
        }
    }
}
