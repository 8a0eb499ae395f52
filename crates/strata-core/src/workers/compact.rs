//! Compactor
//!
//! TTL enforcement: deletes every expired item for an owner and reports what
//! was removed.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::memory::MemoryItem;
use crate::storage::MetadataStore;

/// Deletes expired items.
pub struct Compactor {
    metadata: Arc<dyn MetadataStore>,
}

impl Compactor {
    /// Wire the compactor to the metadata store.
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    /// One expiry pass; returns the removed items.
    pub async fn run_once(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        let now = Utc::now();
        let items = self.metadata.list_by_owner(owner).await?;
        let mut removed = Vec::new();
        for item in items {
            if item.is_expired(now) {
                self.metadata.delete(item.id).await?;
                debug!(owner, id = %item.id, "expired item compacted");
                removed.push(item);
            }
        }
        Ok(removed)
    }
}

// ============================================================================
// TESTS
// ============================================================================
