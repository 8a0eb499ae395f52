//! Full lifecycle journey: write → consolidate → archive → rehydrate → expire.

use strata_core::{MemoryItem, MemoryQuery, MemoryType, MetadataStore, ObjectStore, StorageTier};
use strata_e2e_tests::{episodic_event, perceptual_event, working_event, TestSystem};

#[tokio::test]
async fn consolidation_distills_working_and_perceptual_memory() {
    let harness = TestSystem::new();
    let system = &harness.system;

    system
        .write(working_event("u1", "drafted the launch checklist", &["launch"]))
        .await
        .unwrap();
    system
        .write(working_event("u1", "reviewed rollout risks", &["launch"]))
        .await
        .unwrap();
    system
        .write_perceptual(perceptual_event(
            "u1",
            "dashboard showed a latency spike",
            &["dashboard"],
            0.6,
        ))
        .await
        .unwrap();

    let new_items = system.flush("u1").await.unwrap();

    let session_summary = new_items
        .iter()
        .find(|i| i.tags.contains(&"session-summary".to_string()))
        .expect("session summary synthesized");
    assert_eq!(session_summary.memory_type, MemoryType::Episodic);
    assert!(session_summary.summary.contains("launch checklist"));

    assert!(
        new_items
            .iter()
            .any(|i| i.tags.contains(&"perceptual-summary".to_string())),
        "perceptual highlights synthesized"
    );

    let recurring = new_items
        .iter()
        .find(|i| i.memory_type == MemoryType::Semantic)
        .expect("recurring tag observed");
    assert_eq!(recurring.summary, "Observed recurring tag: launch");
    assert!(recurring.tags.contains(&"derived".to_string()));
}

#[tokio::test]
async fn archived_items_round_trip_through_the_object_store() {
    let harness = TestSystem::new();
    let system = &harness.system;

    let item = system
        .write(episodic_event(
            "u1",
            "vendor contract renewal agreed at current rates",
            &["vendor", "contract"],
            0.7,
        ))
        .await
        .unwrap();

    system.flush("u1").await.unwrap();

    let stored = system
        .metadata_store()
        .get(item.id)
        .await
        .unwrap()
        .expect("item survives archival");
    assert_eq!(stored.tier, StorageTier::Cold);

    let object_key = stored
        .pointer
        .get("object_key")
        .expect("object_key pointer written");
    let payload = system
        .object_store()
        .get(object_key)
        .await
        .unwrap()
        .expect("cold object resolves");
    let entries = payload.as_array().expect("daily notes payload is a list");
    assert!(
        entries
            .iter()
            .any(|entry| entry["id"] == item.id.to_string()),
        "daily notes contain the archived entry"
    );
}

#[tokio::test]
async fn rehydration_promotes_items_under_access_pressure() {
    let harness = TestSystem::new();
    let system = &harness.system;

    let item = system
        .write(episodic_event(
            "u1",
            "the staging cluster credentials rotate on fridays",
            &["ops"],
            0.7,
        ))
        .await
        .unwrap();
    system.flush("u1").await.unwrap();

    // Two accesses are not enough
    system.record_access(item.id).await.unwrap();
    system.record_access(item.id).await.unwrap();
    assert!(system.rehydrate("u1").await.unwrap().is_empty());

    // The third crosses the threshold
    system.record_access(item.id).await.unwrap();
    let warmed = system.rehydrate("u1").await.unwrap();
    assert_eq!(warmed.len(), 1);
    assert_eq!(warmed[0].id, item.id);
    assert_eq!(warmed[0].tier, StorageTier::Hot);

    // Promoted item answers hot queries again
    let bundle = system
        .retrieve(MemoryQuery::new("staging cluster credentials", "u1"))
        .await
        .unwrap();
    assert_eq!(bundle.used_tiers[0], StorageTier::Hot);
    assert!(bundle.results.iter().any(|r| r.item.id == item.id));
}

#[tokio::test]
async fn expired_working_memory_is_compacted() {
    let harness = TestSystem::new();
    let system = &harness.system;

    let mut stale = MemoryItem::new(MemoryType::Working, "u1", "ephemeral scratchpad");
    stale.ttl_seconds = Some(3600);
    stale.created_at = chrono::Utc::now() - chrono::Duration::seconds(3601);
    let stale = system.write(stale).await.unwrap();

    let fresh = system
        .write(working_event("u1", "still relevant scratchpad", &[]))
        .await
        .unwrap();

    system.flush("u1").await.unwrap();

    assert!(system.metadata_store().get(stale.id).await.unwrap().is_none());
    assert!(system.metadata_store().get(fresh.id).await.unwrap().is_some());
}

#[test]
fn blocking_surface_drives_the_same_lifecycle() {
    let harness = TestSystem::new();
    let system = &harness.system;

    let item = system
        .write_blocking(episodic_event(
            "u1",
            "quarterly goals locked for the platform team",
            &["planning"],
            0.7,
        ))
        .unwrap();

    let bundle = system
        .retrieve_text_blocking("quarterly goals platform team", "u1")
        .unwrap();
    assert!(bundle.results.iter().any(|r| r.item.id == item.id));

    // After a flush the item lives in the archive index; a fresh retrieval
    // escalates to find it
    system.flush_blocking("u1").unwrap();
    let bundle = system
        .retrieve_text_blocking("quarterly goals platform team", "u1")
        .unwrap();
    assert!(bundle.used_tiers.contains(&StorageTier::ArchiveIndex));
    assert!(bundle.results.iter().any(|r| r.item.id == item.id));
}
