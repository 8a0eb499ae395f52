//! Owner isolation: no sequence of writes or worker passes leaks memory
//! across owner boundaries.

use strata_core::{
    FeatureStore, GraphStore, MemoryQuery, MemoryType, MetadataStore, StorageTier,
};
use strata_e2e_tests::{episodic_event, perceptual_event, working_event, TestSystem};

#[tokio::test]
async fn queries_never_cross_owners() {
    let harness = TestSystem::new();
    let system = &harness.system;

    for n in 0..5 {
        system
            .write(episodic_event(
                "alice",
                &format!("alice confidential note number {n}"),
                &["private"],
                0.8,
            ))
            .await
            .unwrap();
    }

    let bundle = system
        .retrieve_text("alice confidential note number", "bob")
        .await
        .unwrap();
    assert!(bundle.results.is_empty());
    assert!(bundle.blocks.is_empty());

    let own = system
        .retrieve_text("alice confidential note number", "alice")
        .await
        .unwrap();
    assert!(!own.results.is_empty());
    assert!(own.results.iter().all(|r| r.item.owner == "alice"));
}

#[tokio::test]
async fn escalated_queries_stay_scoped() {
    let harness = TestSystem::new();
    let system = &harness.system;

    system
        .write(episodic_event("alice", "shared vocabulary incident report", &[], 0.7))
        .await
        .unwrap();
    system.flush("alice").await.unwrap();

    // Bob's query uses the same vocabulary and escalates through every tier,
    // but none of Alice's archived data surfaces
    let bundle = system
        .retrieve_text("shared vocabulary incident report", "bob")
        .await
        .unwrap();
    assert!(bundle.results.is_empty());
    assert_eq!(bundle.used_tiers, vec![StorageTier::Hot]);
}

#[tokio::test]
async fn flush_only_touches_the_named_owner() {
    let harness = TestSystem::new();
    let system = &harness.system;

    let alice_item = system
        .write(episodic_event("alice", "alice archivable entry", &[], 0.7))
        .await
        .unwrap();
    let bob_item = system
        .write(episodic_event("bob", "bob archivable entry", &[], 0.7))
        .await
        .unwrap();

    system.flush("alice").await.unwrap();

    let alice_stored = system.metadata_store().get(alice_item.id).await.unwrap().unwrap();
    assert_eq!(alice_stored.tier, StorageTier::Cold);

    let bob_stored = system.metadata_store().get(bob_item.id).await.unwrap().unwrap();
    assert_eq!(bob_stored.tier, StorageTier::Hot);
}

#[tokio::test]
async fn consolidation_reads_only_the_named_owner() {
    let harness = TestSystem::new();
    let system = &harness.system;

    system
        .write(working_event("alice", "alice working item", &["alpha"]))
        .await
        .unwrap();
    system
        .write_perceptual(perceptual_event("bob", "bob perceptual item", &["beta"], 0.6))
        .await
        .unwrap();

    let alice_new = system.flush("alice").await.unwrap();
    assert!(alice_new.iter().all(|i| i.owner == "alice"));
    assert!(
        alice_new
            .iter()
            .all(|i| !i.summary.contains("bob perceptual item")),
        "bob's data must not leak into alice's summaries"
    );

    let bob_new = system.flush("bob").await.unwrap();
    assert!(bob_new.iter().all(|i| i.owner == "bob"));
    assert!(bob_new
        .iter()
        .any(|i| i.memory_type == MemoryType::Episodic
            && i.summary.starts_with("Perceptual highlights:")));
}

#[tokio::test]
async fn shared_backends_keep_graph_and_features_scoped() {
    let harness = TestSystem::new();
    let system = &harness.system;

    let mut alice_fact = episodic_event("alice", "espresso pairs with mornings", &[], 0.7);
    alice_fact.memory_type = MemoryType::Semantic;
    alice_fact.tags = vec!["espresso".to_string(), "morning".to_string()];
    system.write(alice_fact).await.unwrap();

    let alice_related = system
        .graph_store()
        .query_related("alice", "espresso", 10)
        .await
        .unwrap();
    assert_eq!(alice_related, vec!["morning"]);

    let bob_related = system
        .graph_store()
        .query_related("bob", "espresso", 10)
        .await
        .unwrap();
    assert!(bob_related.is_empty());

    system
        .write_perceptual(perceptual_event("alice", "a loud noise", &[], 0.6))
        .await
        .unwrap();
    assert!(system.feature_store().query_features("bob", 10).await.unwrap().is_empty());
    assert_eq!(
        system.feature_store().query_features("alice", 10).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn top_k_splits_across_type_filters() {
    let harness = TestSystem::new();
    let system = &harness.system;

    system
        .write(episodic_event("u1", "filtered retrieval subject", &[], 0.7))
        .await
        .unwrap();

    // Type-filtered query still finds the episodic item
    let bundle = system
        .retrieve(
            MemoryQuery::new("filtered retrieval subject", "u1")
                .with_types(vec![MemoryType::Episodic]),
        )
        .await
        .unwrap();
    assert_eq!(bundle.results.len(), 1);

    // Filtering to a different type excludes it
    let bundle = system
        .retrieve(
            MemoryQuery::new("filtered retrieval subject", "u1")
                .with_types(vec![MemoryType::Semantic]),
        )
        .await
        .unwrap();
    assert!(bundle.results.is_empty());
}
