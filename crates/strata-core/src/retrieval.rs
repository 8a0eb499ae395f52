//! Retrieval orchestration
//!
//! Cascades hot → archive-index → cold hydrate, widening only while the
//! confidence total stays under the plan thresholds. Escalation is inclusive:
//! earlier-tier results are kept and the final dedup/rerank resolves overlap.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::config::RetrievalPlan;
use crate::confidence::evaluate_confidence;
use crate::error::Result;
use crate::memory::{
    MemoryBlock, MemoryBundle, MemoryQuery, MemoryType, RetrievalTrace, ScoredMemory, StorageTier,
};
use crate::storage::{IndexFilter, MetadataStore, ObjectStore, VectorIndex};
use crate::text::clamp_unit;

/// Multi-tier cascading searcher producing [`MemoryBundle`]s.
pub struct RetrievalOrchestrator {
    metadata: Arc<dyn MetadataStore>,
    index: Arc<dyn VectorIndex>,
    objects: Arc<dyn ObjectStore>,
    plan: RetrievalPlan,
}

impl RetrievalOrchestrator {
    /// Wire the orchestrator to its capability backends.
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        index: Arc<dyn VectorIndex>,
        objects: Arc<dyn ObjectStore>,
        plan: RetrievalPlan,
    ) -> Self {
        Self {
            metadata,
            index,
            objects,
            plan,
        }
    }

    /// Run the full cascade for one query.
    pub async fn retrieve(&self, query: &MemoryQuery) -> Result<MemoryBundle> {
        let mut used_tiers: Vec<StorageTier> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut trace = RetrievalTrace::default();

        // Hot sweep, budget split across queried types
        trace.add_step("hot search per type");
        let types: Vec<MemoryType> = query
            .types
            .clone()
            .unwrap_or_else(|| MemoryType::ALL.to_vec());
        let per_type_limit = (self.plan.hot_top_k / types.len().max(1)).max(1);

        let mut hot_results: Vec<ScoredMemory> = Vec::new();
        for memory_type in &types {
            let filter = IndexFilter::scoped(query.owner.clone(), StorageTier::Hot)
                .with_types(Some(vec![*memory_type]));
            hot_results.extend(self.index.query(query, &filter, per_type_limit).await?);
        }
        used_tiers.push(StorageTier::Hot);
        let mut confidence = evaluate_confidence(query, &hot_results);

        let mut results = hot_results;

        if confidence.total < self.plan.hot_confidence {
            trace.add_escalation("hot confidence below threshold; searching archive");
            debug!(
                owner = %query.owner,
                total = confidence.total,
                "escalating retrieval to archive index"
            );
            let filter = IndexFilter::scoped(query.owner.clone(), StorageTier::ArchiveIndex)
                .with_types(query.types.clone());
            let archive_results = self
                .index
                .query(query, &filter, self.plan.archive_top_k)
                .await?;
            if !archive_results.is_empty() {
                results.extend(archive_results.iter().cloned());
                used_tiers.push(StorageTier::ArchiveIndex);
                confidence = evaluate_confidence(query, &results);
            }

            if confidence.total < self.plan.cold_fetch_confidence {
                trace.add_escalation("archive confidence low; fetching cold payloads");
                let cold_candidates: Vec<&ScoredMemory> = archive_results
                    .iter()
                    .filter(|r| r.score >= self.plan.cold_fetch_min_score)
                    .take(self.plan.cold_fetch_limit)
                    .collect();
                let attempted = !cold_candidates.is_empty();
                for candidate in cold_candidates {
                    if let Some(hydrated) =
                        self.hydrate_cold(candidate, &mut warnings).await?
                    {
                        results.push(hydrated);
                    }
                }
                if attempted {
                    used_tiers.push(StorageTier::Cold);
                    confidence = evaluate_confidence(query, &results);
                }
            }
        }

        let results = self.hydrate_skeletons(results).await?;
        let reranked = self.rerank(self.dedupe(results));
        let blocks = self.to_blocks(&reranked);
        trace.sources = reranked
            .iter()
            .take(10)
            .map(|r| format!("{}:{}", r.item.memory_type, r.tier))
            .collect();

        Ok(MemoryBundle {
            query: query.text.clone(),
            results: reranked,
            blocks,
            confidence,
            used_tiers,
            trace,
            warnings,
        })
    }

    /// Fetch one archive candidate's payload from the object store. Daily
    /// notes are JSON arrays, so list payloads dispatch on the entry id.
    async fn hydrate_cold(
        &self,
        candidate: &ScoredMemory,
        warnings: &mut Vec<String>,
    ) -> Result<Option<ScoredMemory>> {
        let Some(pointer) = candidate.item.pointer.get("object_key") else {
            return Ok(None);
        };
        let Some(payload) = self.objects.get(pointer).await? else {
            warnings.push(format!("Missing cold object: {pointer}"));
            return Ok(None);
        };

        let payload = match payload {
            Value::Array(entries) => {
                let wanted = candidate.item.id.to_string();
                match entries
                    .into_iter()
                    .find(|entry| entry.get("id").and_then(Value::as_str) == Some(wanted.as_str()))
                {
                    Some(entry) => entry,
                    None => {
                        warnings.push(format!(
                            "Missing id {} in daily notes: {pointer}",
                            candidate.item.id
                        ));
                        return Ok(None);
                    }
                }
            }
            other => other,
        };

        let mut hydrated = candidate.item.clone();
        hydrated.content = Some(payload);
        hydrated.tier = StorageTier::Cold;
        Ok(Some(ScoredMemory {
            item: hydrated,
            score: candidate.score,
            tier: StorageTier::Cold,
            explanation: Some("cold hydrate".to_string()),
        }))
    }

    /// Replace skeletal index entries (no content, no tags) with the full
    /// metadata record.
    async fn hydrate_skeletons(&self, results: Vec<ScoredMemory>) -> Result<Vec<ScoredMemory>> {
        let mut hydrated = Vec::with_capacity(results.len());
        for mut result in results {
            if result.item.content.is_none() && result.item.tags.is_empty() {
                if let Some(full_item) = self.metadata.get(result.item.id).await? {
                    result.item = full_item;
                }
            }
            hydrated.push(result);
        }
        Ok(hydrated)
    }

    // Ties go to the later copy, so a hydrated cold result supersedes the
    // archive skeleton it was fetched for.
    fn dedupe(&self, results: Vec<ScoredMemory>) -> Vec<ScoredMemory> {
        let mut best: HashMap<Uuid, ScoredMemory> = HashMap::new();
        for result in results {
            match best.get(&result.item.id) {
                Some(existing) if existing.score > result.score => {}
                _ => {
                    best.insert(result.item.id, result);
                }
            }
        }
        best.into_values().collect()
    }

    fn rerank(&self, results: Vec<ScoredMemory>) -> Vec<ScoredMemory> {
        let final_score =
            |result: &ScoredMemory| clamp_unit(0.75 * result.score + 0.25 * result.item.confidence);

        let mut reranked = results;
        reranked.sort_by(|a, b| {
            final_score(b)
                .partial_cmp(&final_score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        reranked.truncate(self.plan.max_results);
        reranked
    }

    fn to_blocks(&self, results: &[ScoredMemory]) -> Vec<MemoryBlock> {
        results
            .iter()
            .map(|result| MemoryBlock {
                text: result.item.text().to_string(),
                item_id: result.item.id,
                memory_type: result.item.memory_type,
                tier: result.tier,
                score: result.score,
                metadata: json!({
                    "owner": result.item.owner,
                    "tags": result.item.tags,
                }),
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
