//! Consolidation worker
//!
//! Distills an owner's short-lived hot items into fewer, more durable ones:
//! working items into an episodic session summary, perceptual items into an
//! episodic highlight reel, and recurring tags into semantic observations.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::config::ConsolidationConfig;
use crate::error::Result;
use crate::indexers::EpisodicIndexer;
use crate::memory::{MemoryItem, MemoryType, StorageTier};
use crate::storage::{MetadataStore, VectorIndex};

/// Synthesizes episodic and semantic items from hot working/perceptual ones.
pub struct ConsolidationWorker {
    metadata: Arc<dyn MetadataStore>,
    indexer: EpisodicIndexer,
    config: ConsolidationConfig,
}

impl ConsolidationWorker {
    /// Wire the worker to its backends.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        index: Arc<dyn VectorIndex>,
        config: ConsolidationConfig,
    ) -> Self {
        Self {
            metadata,
            indexer: EpisodicIndexer::new(index),
            config,
        }
    }

    /// One consolidation pass; returns the newly synthesized items.
    pub async fn run_once(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        let items = self.metadata.list_by_owner(owner).await?;
        let working: Vec<&MemoryItem> = items
            .iter()
            .filter(|i| i.memory_type == MemoryType::Working && i.tier == StorageTier::Hot)
            .collect();
        let perceptual: Vec<&MemoryItem> = items
            .iter()
            .filter(|i| i.memory_type == MemoryType::Perceptual && i.tier == StorageTier::Hot)
            .collect();

        let mut new_items: Vec<MemoryItem> = Vec::new();

        if !working.is_empty() {
            let summary = working
                .iter()
                .take(5)
                .map(|i| i.summary.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            let mut item = MemoryItem::new(
                MemoryType::Episodic,
                owner,
                format!("Session summary: {summary}"),
            );
            item.tags = vec!["session-summary".to_string()];
            item.confidence = 0.6;
            new_items.push(item);
        }

        if !perceptual.is_empty() {
            let snippets = perceptual
                .iter()
                .take(self.config.perceptual_summary_limit)
                .map(|i| i.summary.as_str())
                .collect::<Vec<_>>()
                .join(" | ");
            let mut item = MemoryItem::new(
                MemoryType::Episodic,
                owner,
                format!("Perceptual highlights: {snippets}"),
            );
            item.tags = vec!["perceptual-summary".to_string()];
            item.confidence = 0.55;
            new_items.push(item);
        }

        let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for item in working.iter().chain(perceptual.iter()) {
            for tag in &item.tags {
                *tag_counts.entry(tag.as_str()).or_default() += 1;
            }
        }
        for (tag, count) in tag_counts {
            if count >= self.config.semantic_min_count {
                let mut item = MemoryItem::new(
                    MemoryType::Semantic,
                    owner,
                    format!("Observed recurring tag: {tag}"),
                );
                item.tags = vec![tag.to_string(), "derived".to_string()];
                item.confidence = 0.65;
                item.stability = 0.6;
                new_items.push(item);
            }
        }

        for item in &new_items {
            self.metadata.upsert(item).await?;
            self.indexer.index_hot(item).await?;
        }

        if !new_items.is_empty() {
            info!(owner, synthesized = new_items.len(), "consolidation pass complete");
        }
        Ok(new_items)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryQuery;
    use crate::storage::{IndexFilter, SqliteMetadataStore, TokenVectorIndex};
    use tempfile::TempDir;

    struct Fixture {
        metadata: Arc<SqliteMetadataStore>,
        index: Arc<TokenVectorIndex>,
        worker: ConsolidationWorker,
        _dir: TempDir,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let metadata =
            Arc::new(SqliteMetadataStore::new(dir.path().join("meta.sqlite3")).unwrap());
        let index = Arc::new(TokenVectorIndex::new());
        let worker = ConsolidationWorker::new(
            metadata.clone(),
            index.clone(),
            ConsolidationConfig::default(),
        );
        Fixture {
            metadata,
            index,
            worker,
            _dir: dir,
        }
    }

    fn hot_item(owner: &str, memory_type: MemoryType, summary: &str, tags: &[&str]) -> MemoryItem {
        let mut item = MemoryItem::new(memory_type, owner, summary);
        item.tags = tags.iter().map(|t| t.to_string()).collect();
        item
    }

    #[tokio::test]
    async fn test_working_items_become_session_summary() {
        let fixture = fixture();
        for n in 0..3 {
            fixture
                .metadata
                .upsert(&hot_item("u1", MemoryType::Working, &format!("step {n}"), &[]))
                .await
                .unwrap();
        }

        let new_items = fixture.worker.run_once("u1").await.unwrap();
        assert_eq!(new_items.len(), 1);
        let summary = &new_items[0];
        assert_eq!(summary.memory_type, MemoryType::Episodic);
        assert!(summary.summary.starts_with("Session summary:"));
        assert!(summary.summary.contains("step 0"));
        assert_eq!(summary.tags, vec!["session-summary"]);
        assert!((summary.confidence - 0.6).abs() < f64::EPSILON);

        // Synthesized item is searchable hot
        let hits = fixture
            .index
            .query(
                &MemoryQuery::new("session summary step", "u1"),
                &IndexFilter::scoped("u1", StorageTier::Hot),
                10,
            )
            .await
            .unwrap();
        assert!(!hits.is_empty());
    }

    #[tokio::test]
    async fn test_session_summary_caps_at_five_sources() {
        let fixture = fixture();
        for n in 0..8 {
            fixture
                .metadata
                .upsert(&hot_item("u1", MemoryType::Working, &format!("task{n}"), &[]))
                .await
                .unwrap();
        }
        let new_items = fixture.worker.run_once("u1").await.unwrap();
        let joined = &new_items[0].summary;
        assert_eq!(joined.matches(" | ").count(), 4);
    }

    #[tokio::test]
    async fn test_perceptual_items_become_highlights() {
        let fixture = fixture();
        fixture
            .metadata
            .upsert(&hot_item("u1", MemoryType::Perceptual, "saw a red chart", &[]))
            .await
            .unwrap();

        let new_items = fixture.worker.run_once("u1").await.unwrap();
        assert_eq!(new_items.len(), 1);
        assert!(new_items[0].summary.starts_with("Perceptual highlights:"));
        assert_eq!(new_items[0].tags, vec!["perceptual-summary"]);
        assert!((new_items[0].confidence - 0.55).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_recurring_tags_become_semantic_items() {
        let fixture = fixture();
        fixture
            .metadata
            .upsert(&hot_item("u1", MemoryType::Working, "a", &["deploy"]))
            .await
            .unwrap();
        fixture
            .metadata
            .upsert(&hot_item("u1", MemoryType::Perceptual, "b", &["deploy", "rare"]))
            .await
            .unwrap();

        let new_items = fixture.worker.run_once("u1").await.unwrap();
        let semantic: Vec<&MemoryItem> = new_items
            .iter()
            .filter(|i| i.memory_type == MemoryType::Semantic)
            .collect();
        assert_eq!(semantic.len(), 1);
        assert_eq!(semantic[0].summary, "Observed recurring tag: deploy");
        assert_eq!(semantic[0].tags, vec!["deploy", "derived"]);
        assert!((semantic[0].stability - 0.6).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_cold_and_episodic_items_are_ignored() {
        let fixture = fixture();
        let mut cold_working = hot_item("u1", MemoryType::Working, "cold one", &[]);
        cold_working.tier = StorageTier::Cold;
        fixture.metadata.upsert(&cold_working).await.unwrap();
        fixture
            .metadata
            .upsert(&hot_item("u1", MemoryType::Episodic, "already episodic", &[]))
            .await
            .unwrap();

        let new_items = fixture.worker.run_once("u1").await.unwrap();
        assert!(new_items.is_empty());
    }
}
