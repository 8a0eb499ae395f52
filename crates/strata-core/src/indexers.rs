//! Index adapters
//!
//! Thin wrappers that know how one memory type lands in one backend. The
//! write path fans out through these; each adapter filters internally rather
//! than trusting the caller.

use std::sync::Arc;

use serde_json::json;

use crate::error::Result;
use crate::memory::{MemoryItem, MemoryType, StorageTier};
use crate::storage::{FeatureStore, GraphStore, IndexRecord, VectorIndex};

// ============================================================================
// EPISODIC INDEXER
// ============================================================================

/// Writes items into the vector index, hot (full text) or archive (summary).
#[derive(Clone)]
pub struct EpisodicIndexer {
    index: Arc<dyn VectorIndex>,
}

impl EpisodicIndexer {
    /// Wrap a vector index.
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    /// Index the full text under the hot tier.
    pub async fn index_hot(&self, item: &MemoryItem) -> Result<()> {
        self.index
            .upsert(
                item.id,
                item.text(),
                IndexRecord::for_tier(item, StorageTier::Hot),
            )
            .await
    }

    /// Index only the summary under the archive tier; content stays cold.
    pub async fn index_archive(&self, item: &MemoryItem) -> Result<()> {
        self.index
            .upsert(
                item.id,
                &item.summary,
                IndexRecord::for_tier(item, StorageTier::ArchiveIndex),
            )
            .await
    }
}

// ============================================================================
// SEMANTIC GRAPH INDEXER
// ============================================================================

/// Extracts `related_to` edges from the tags of semantic items.
#[derive(Clone)]
pub struct SemanticGraphIndexer {
    graph: Arc<dyn GraphStore>,
}

impl SemanticGraphIndexer {
    /// Wrap a graph store.
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Write edges `(tags[0], related_to, tags[i])` for semantic items with
    /// at least two tags; everything else is ignored.
    pub async fn index(&self, item: &MemoryItem) -> Result<()> {
        if item.memory_type != MemoryType::Semantic {
            return Ok(());
        }
        let Some((subject, rest)) = item.tags.split_first() else {
            return Ok(());
        };
        if rest.is_empty() {
            return Ok(());
        }
        for tag in rest {
            self.graph
                .upsert_fact(&item.owner, subject, "related_to", tag)
                .await?;
        }
        Ok(())
    }
}

// ============================================================================
// PERCEPTUAL INDEXER
// ============================================================================

/// Summarizes perceptual items into feature-store entries.
#[derive(Clone)]
pub struct PerceptualIndexer {
    features: Arc<dyn FeatureStore>,
}

impl PerceptualIndexer {
    /// Wrap a feature store.
    pub fn new(features: Arc<dyn FeatureStore>) -> Self {
        Self { features }
    }

    /// Write `{summary, tags, confidence}` for perceptual items only.
    pub async fn index(&self, item: &MemoryItem) -> Result<()> {
        if item.memory_type != MemoryType::Perceptual {
            return Ok(());
        }
        let payload = json!({
            "summary": item.summary,
            "tags": item.tags,
            "confidence": item.confidence,
        });
        self.features.write_feature(&item.owner, &payload).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
