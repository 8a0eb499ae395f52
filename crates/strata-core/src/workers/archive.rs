//! Archiver worker
//!
//! Moves an owner's non-working hot items to cold: the payload lands in a
//! per-day daily-notes file in the object store, the canonical record flips
//! to tier cold with pointers back to the payload, and the vector index keeps
//! a summary-only entry under the archive tier.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::indexers::EpisodicIndexer;
use crate::memory::{MemoryItem, MemoryType, StorageTier};
use crate::storage::{MetadataStore, ObjectStore, VectorIndex};

/// Offloads hot items to the object store, keeping an archive-index entry.
pub struct ArchiverWorker {
    metadata: Arc<dyn MetadataStore>,
    objects: Arc<dyn ObjectStore>,
    indexer: EpisodicIndexer,
}

impl ArchiverWorker {
    /// Wire the worker to its backends.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        objects: Arc<dyn ObjectStore>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            metadata,
            objects,
            indexer: EpisodicIndexer::new(index),
        }
    }

    /// One archival pass; returns the items moved to cold.
    pub async fn run_once(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        let items = self.metadata.list_by_owner(owner).await?;
        let to_archive: Vec<MemoryItem> = items
            .into_iter()
            .filter(|i| i.tier == StorageTier::Hot && i.memory_type != MemoryType::Working)
            .collect();

        let mut archived = Vec::with_capacity(to_archive.len());
        for mut item in to_archive {
            let date_path = item.created_at.format("%Y/%m/%d");
            let key = format!("{owner}/{date_path}/daily_notes");
            let payload = json!({
                "id": item.id.to_string(),
                "summary": item.summary,
                "content": item.content,
                "tags": item.tags,
                "type": item.memory_type.as_str(),
                "owner": item.owner,
                "created_at": item.created_at.to_rfc3339(),
            });
            let object_path = self.objects.append(&key, &payload).await?;

            item.pointer
                .insert("object_key".to_string(), object_path);
            item.pointer.insert("archive_key".to_string(), key);
            item.tier = StorageTier::Cold;
            item.updated_at = Utc::now();

            self.metadata.upsert(&item).await?;
            self.indexer.index_archive(&item).await?;
            archived.push(item);
        }

        if !archived.is_empty() {
            info!(owner, archived = archived.len(), "archival pass complete");
        }
        Ok(archived)
    }
}

// ============================================================================
// TESTS
// ============================================================================
