//! In-process reference backends
//!
//! [`TokenVectorIndex`] is the lexical index used in local mode and tests:
//! an inverted token map scoring by query-token overlap. [`InMemoryGraphStore`]
//! is the matching fact graph. Both are `Send + Sync` behind internal locks
//! and never suspend beyond the trait boundary.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{MemoryError, Result};
use crate::memory::{MemoryQuery, ScoredMemory};
use crate::storage::{GraphStore, IndexFilter, IndexRecord, VectorIndex};
use crate::text::unique_tokens;

// ============================================================================
// TOKEN VECTOR INDEX
// ============================================================================

#[derive(Default)]
struct TokenIndexInner {
    postings: HashMap<String, Vec<Uuid>>,
    records: HashMap<Uuid, IndexRecord>,
    texts: HashMap<Uuid, String>,
}

/// Inverted-token similarity index.
///
/// Score = |query tokens ∩ entry tokens| / |query tokens|.
#[derive(Default)]
pub struct TokenVectorIndex {
    inner: RwLock<TokenIndexInner>,
}

impl TokenVectorIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.records.len()).unwrap_or(0)
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_postings(inner: &mut TokenIndexInner, id: Uuid) {
        if let Some(old_text) = inner.texts.remove(&id) {
            for token in unique_tokens(&old_text) {
                if let Some(ids) = inner.postings.get_mut(&token) {
                    ids.retain(|existing| *existing != id);
                    if ids.is_empty() {
                        inner.postings.remove(&token);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl VectorIndex for TokenVectorIndex {
    async fn upsert(&self, id: Uuid, text: &str, record: IndexRecord) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| MemoryError::Backend("token index lock poisoned".to_string()))?;

        Self::remove_postings(&mut inner, id);
        for token in unique_tokens(text) {
            inner.postings.entry(token).or_default().push(id);
        }
        inner.texts.insert(id, text.to_string());
        inner.records.insert(id, record);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| MemoryError::Backend("token index lock poisoned".to_string()))?;
        Self::remove_postings(&mut inner, id);
        inner.records.remove(&id);
        Ok(())
    }

    async fn query(
        &self,
        query: &MemoryQuery,
        filter: &IndexFilter,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        let query_tokens = unique_tokens(&query.text);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self
            .inner
            .read()
            .map_err(|_| MemoryError::Backend("token index lock poisoned".to_string()))?;

        let mut overlap: HashMap<Uuid, usize> = HashMap::new();
        for token in &query_tokens {
            if let Some(ids) = inner.postings.get(token) {
                for id in ids {
                    *overlap.entry(*id).or_default() += 1;
                }
            }
        }

        let mut scored: Vec<ScoredMemory> = overlap
            .into_iter()
            .filter_map(|(id, hits)| {
                let record = inner.records.get(&id)?;
                if !filter.matches(record) {
                    return None;
                }
                Some(ScoredMemory {
                    item: record.item.clone(),
                    score: hits as f64 / query_tokens.len().max(1) as f64,
                    tier: record.tier,
                    explanation: Some("token overlap".to_string()),
                })
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

// ============================================================================
// IN-MEMORY GRAPH STORE
// ============================================================================

/// Fact graph keyed by `owner:subject:predicate`.
#[derive(Default)]
pub struct InMemoryGraphStore {
    edges: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryGraphStore {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn upsert_fact(
        &self,
        owner: &str,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Result<()> {
        let mut edges = self
            .edges
            .write()
            .map_err(|_| MemoryError::Backend("graph store lock poisoned".to_string()))?;
        edges
            .entry(format!("{owner}:{subject}:{predicate}"))
            .or_default()
            .push(object.to_string());
        Ok(())
    }

    async fn query_related(
        &self,
        owner: &str,
        subject: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        let edges = self
            .edges
            .read()
            .map_err(|_| MemoryError::Backend("graph store lock poisoned".to_string()))?;
        let prefix = format!("{owner}:{subject}:");
        let mut related: Vec<String> = edges
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .flat_map(|(_, targets)| targets.iter().cloned())
            .collect();
        related.truncate(limit);
        Ok(related)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryItem, MemoryType, StorageTier};

    fn hot_record(owner: &str, memory_type: MemoryType, text: &str) -> (MemoryItem, IndexRecord) {
        let mut item = MemoryItem::new(memory_type, owner, text);
        item.content = Some(serde_json::Value::String(text.to_string()));
        let record = IndexRecord::for_tier(&item, StorageTier::Hot);
        (item, record)
    }

    #[tokio::test]
    async fn test_upsert_and_query_scores_by_overlap() {
        let index = TokenVectorIndex::new();
        let (item, record) = hot_record("u1", MemoryType::Episodic, "alpha beta gamma");
        index.upsert(item.id, "alpha beta gamma", record).await.unwrap();

        let query = MemoryQuery::new("alpha beta delta", "u1");
        let filter = IndexFilter::scoped("u1", StorageTier::Hot);
        let results = index.query(&query, &filter, 10).await.unwrap();

        assert_eq!(results.len(), 1);
        // 2 of 3 query tokens matched
        assert!((results[0].score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(results[0].tier, StorageTier::Hot);
    }

    #[tokio::test]
    async fn test_query_respects_owner_and_tier_filters() {
        let index = TokenVectorIndex::new();
        let (a, rec_a) = hot_record("u1", MemoryType::Episodic, "carbon policy");
        let (b, rec_b) = hot_record("u2", MemoryType::Episodic, "carbon policy");
        index.upsert(a.id, "carbon policy", rec_a).await.unwrap();
        index.upsert(b.id, "carbon policy", rec_b).await.unwrap();

        let query = MemoryQuery::new("carbon", "u1");
        let only_u1 = index
            .query(&query, &IndexFilter::scoped("u1", StorageTier::Hot), 10)
            .await
            .unwrap();
        assert_eq!(only_u1.len(), 1);
        assert_eq!(only_u1[0].item.owner, "u1");

        let archive = index
            .query(&query, &IndexFilter::scoped("u1", StorageTier::ArchiveIndex), 10)
            .await
            .unwrap();
        assert!(archive.is_empty());
    }

    #[tokio::test]
    async fn test_reupsert_replaces_old_tokens() {
        let index = TokenVectorIndex::new();
        let (item, record) = hot_record("u1", MemoryType::Episodic, "old words here");
        index.upsert(item.id, "old words here", record.clone()).await.unwrap();
        index.upsert(item.id, "new phrasing entirely", record).await.unwrap();

        let filter = IndexFilter::scoped("u1", StorageTier::Hot);
        let stale = index
            .query(&MemoryQuery::new("old words", "u1"), &filter, 10)
            .await
            .unwrap();
        assert!(stale.is_empty());

        let fresh = index
            .query(&MemoryQuery::new("new phrasing", "u1"), &filter, 10)
            .await
            .unwrap();
        assert_eq!(fresh.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let index = TokenVectorIndex::new();
        let (item, record) = hot_record("u1", MemoryType::Episodic, "temporary entry");
        index.upsert(item.id, "temporary entry", record).await.unwrap();
        assert_eq!(index.len(), 1);

        index.delete(item.id).await.unwrap();
        assert!(index.is_empty());

        let results = index
            .query(
                &MemoryQuery::new("temporary", "u1"),
                &IndexFilter::scoped("u1", StorageTier::Hot),
                10,
            )
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let index = TokenVectorIndex::new();
        let (item, record) = hot_record("u1", MemoryType::Episodic, "something");
        index.upsert(item.id, "something", record).await.unwrap();

        let results = index
            .query(&MemoryQuery::new("", "u1"), &IndexFilter::default(), 10)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_graph_store_roundtrip() {
        let graph = InMemoryGraphStore::new();
        graph.upsert_fact("u1", "eu", "related_to", "policy").await.unwrap();
        graph.upsert_fact("u1", "eu", "related_to", "carbon").await.unwrap();
        graph.upsert_fact("u2", "eu", "related_to", "other").await.unwrap();

        let related = graph.query_related("u1", "eu", 10).await.unwrap();
        assert_eq!(related.len(), 2);
        assert!(!related.contains(&"other".to_string()));

        let limited = graph.query_related("u1", "eu", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }
}
