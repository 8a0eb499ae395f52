//! Rehydrator worker
//!
//! Tracks access pressure on cold items and promotes the frequently-touched
//! ones back to hot. The counter is process-local: losing it on restart only
//! costs warm-up pressure, never correctness.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{MemoryError, Result};
use crate::indexers::EpisodicIndexer;
use crate::memory::{MemoryItem, StorageTier};
use crate::storage::{MetadataStore, VectorIndex};

/// Promotes cold items back to hot once they are accessed often enough.
pub struct RehydratorWorker {
    metadata: Arc<dyn MetadataStore>,
    indexer: EpisodicIndexer,
    access_threshold: u32,
    access_counts: Mutex<HashMap<Uuid, u32>>,
}

impl RehydratorWorker {
    /// Wire the worker to its backends.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        index: Arc<dyn VectorIndex>,
        access_threshold: u32,
    ) -> Self {
        Self {
            metadata,
            indexer: EpisodicIndexer::new(index),
            access_threshold,
            access_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Count one access against an item.
    pub fn record_access(&self, id: Uuid) -> Result<()> {
        let mut counts = self
            .access_counts
            .lock()
            .map_err(|_| MemoryError::Backend("access counter lock poisoned".to_string()))?;
        *counts.entry(id).or_default() += 1;
        Ok(())
    }

    /// Current count for an item (0 when never accessed).
    pub fn access_count(&self, id: Uuid) -> u32 {
        self.access_counts
            .lock()
            .map(|counts| counts.get(&id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// One promotion pass; returns the items warmed back to hot.
    ///
    /// Counters are not reset on promotion, so an item that stays under
    /// pressure keeps qualifying on later passes.
    pub async fn run_once(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        let items = self.metadata.list_by_owner(owner).await?;
        let mut warmed = Vec::new();
        for mut item in items {
            if item.tier != StorageTier::Cold {
                continue;
            }
            if self.access_count(item.id) < self.access_threshold {
                continue;
            }
            item.tier = StorageTier::Hot;
            item.updated_at = Utc::now();
            self.metadata.upsert(&item).await?;
            self.indexer.index_hot(&item).await?;
            warmed.push(item);
        }

        if !warmed.is_empty() {
            info!(owner, promoted = warmed.len(), "rehydration pass complete");
        }
        Ok(warmed)
    }
}

// ============================================================================
// TESTS
// ============================================================================
