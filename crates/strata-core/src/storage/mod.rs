//! Storage capabilities
//!
//! Five object-safe async interfaces separate the engine from any physical
//! backend. Concrete implementations are injected at facade construction:
//! the crate ships SQLite-backed metadata/feature stores, a file-based object
//! store, and in-process vector/graph references.
//!
//! Every method may suspend; none holds a lock across an await point.

mod memory;
mod object;
mod sqlite;

pub use memory::{InMemoryGraphStore, TokenVectorIndex};
pub use object::FileObjectStore;
pub use sqlite::{SqliteFeatureStore, SqliteMetadataStore};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::memory::{MemoryItem, MemoryQuery, MemoryType, ScoredMemory, StorageTier};

// ============================================================================
// INDEX RECORDS AND FILTERS
// ============================================================================

/// Metadata carried alongside a vector-index entry.
///
/// Embeds the item (a skeleton is acceptable) so queries can return results
/// without a metadata-store round trip.
#[derive(Debug, Clone)]
pub struct IndexRecord {
    /// Owner scope of the entry
    pub owner: String,
    /// Tier the entry is indexed under (may differ from `item.tier`)
    pub tier: StorageTier,
    /// Kind of memory
    pub memory_type: MemoryType,
    /// The indexed item
    pub item: MemoryItem,
}

impl IndexRecord {
    /// Build a record indexing `item` under the given tier.
    pub fn for_tier(item: &MemoryItem, tier: StorageTier) -> Self {
        Self {
            owner: item.owner.clone(),
            tier,
            memory_type: item.memory_type,
            item: item.clone(),
        }
    }
}

/// Constraints a vector-index query must honor.
#[derive(Debug, Clone, Default)]
pub struct IndexFilter {
    /// Restrict to one owner
    pub owner: Option<String>,
    /// Restrict to one tier
    pub tier: Option<StorageTier>,
    /// Restrict to a set of memory types
    pub types: Option<Vec<MemoryType>>,
}

impl IndexFilter {
    /// Filter scoped to an owner and tier.
    pub fn scoped(owner: impl Into<String>, tier: StorageTier) -> Self {
        Self {
            owner: Some(owner.into()),
            tier: Some(tier),
            types: None,
        }
    }

    /// Restrict to a set of memory types.
    pub fn with_types(mut self, types: Option<Vec<MemoryType>>) -> Self {
        self.types = types;
        self
    }

    /// True when the record passes every set constraint.
    pub fn matches(&self, record: &IndexRecord) -> bool {
        if let Some(owner) = &self.owner {
            if record.owner != *owner {
                return false;
            }
        }
        if let Some(tier) = self.tier {
            if record.tier != tier {
                return false;
            }
        }
        if let Some(types) = &self.types {
            if !types.contains(&record.memory_type) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// CAPABILITY INTERFACES
// ============================================================================

/// Canonical home of [`MemoryItem`] records.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert or replace an item by id.
    async fn upsert(&self, item: &MemoryItem) -> Result<()>;

    /// Fetch an item by id.
    async fn get(&self, id: Uuid) -> Result<Option<MemoryItem>>;

    /// Delete an item by id (no-op when absent).
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// All items belonging to an owner.
    async fn list_by_owner(&self, owner: &str) -> Result<Vec<MemoryItem>>;

    /// Items belonging to an owner, restricted to the given types.
    async fn list_by_owner_and_type(
        &self,
        owner: &str,
        types: &[MemoryType],
    ) -> Result<Vec<MemoryItem>>;

    /// Stamp `last_accessed` for an item.
    async fn update_access(&self, id: Uuid) -> Result<()>;
}

/// Similarity index over item text; lexical or embedding-backed.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Index `text` for `id`, replacing any prior entry.
    async fn upsert(&self, id: Uuid, text: &str, record: IndexRecord) -> Result<()>;

    /// Remove an entry (no-op when absent).
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Top matches for the query under the filter; scores in [0, 1],
    /// higher is better, sorted descending.
    async fn query(
        &self,
        query: &MemoryQuery,
        filter: &IndexFilter,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>>;
}

/// Cold payload storage keyed by path-like strings (`.json` implicit).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a payload, returning the physical path.
    async fn put(&self, key: &str, payload: &Value) -> Result<String>;

    /// Read a payload, `None` when the key does not resolve.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Append to a list-valued key. Stores without native append semantics
    /// inherit this default, which overwrites via `put`.
    async fn append(&self, key: &str, payload: &Value) -> Result<String> {
        self.put(key, payload).await
    }
}

/// Append-only log of perceptual feature payloads.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    /// Record a feature payload for an owner.
    async fn write_feature(&self, owner: &str, payload: &Value) -> Result<()>;

    /// Most recent feature payloads for an owner, newest first.
    async fn query_features(&self, owner: &str, limit: usize) -> Result<Vec<Value>>;
}

/// Lightweight fact graph for semantic relationships.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Record a `(subject, predicate, object)` fact for an owner.
    async fn upsert_fact(
        &self,
        owner: &str,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<()>;

    /// Objects related to a subject, across predicates.
    async fn query_related(&self, owner: &str, subject: &str, limit: usize)
        -> Result<Vec<String>>;
}

// ============================================================================
// TESTS
// ============================================================================
