//! Query and result types for retrieval.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::memory::item::{MemoryItem, MemoryType, StorageTier};

// ============================================================================
// QUERY
// ============================================================================

fn default_top_k() -> usize {
    10
}

/// A free-text retrieval request scoped to one owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryQuery {
    /// Query text
    pub text: String,
    /// Owner scope; results never cross owners
    pub owner: String,
    /// Optional memory-type filter (all types when unset)
    #[serde(default)]
    pub types: Option<Vec<MemoryType>>,
    /// Requested result count
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Optional recency window; carried for backend use
    #[serde(default)]
    pub time_range_seconds: Option<u64>,
}

impl MemoryQuery {
    /// Create a query with default budget.
    pub fn new(text: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            owner: owner.into(),
            types: None,
            top_k: default_top_k(),
            time_range_seconds: None,
        }
    }

    /// Restrict to a set of memory types.
    pub fn with_types(mut self, types: Vec<MemoryType>) -> Self {
        self.types = Some(types);
        self
    }
}

// ============================================================================
// SCORED RESULTS
// ============================================================================

/// A retrieval hit with its score and the tier it was found in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMemory {
    /// The matched item (possibly a skeleton from the vector index)
    pub item: MemoryItem,
    /// Match score in [0, 1]
    pub score: f64,
    /// Tier the hit came from
    pub tier: StorageTier,
    /// Optional human-readable scoring note
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Presentation-ready evidence row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBlock {
    /// Display text (item content when plain, summary otherwise)
    pub text: String,
    /// Source item id
    pub item_id: Uuid,
    /// Kind of memory
    pub memory_type: MemoryType,
    /// Tier the evidence came from
    pub tier: StorageTier,
    /// Final reranked score
    pub score: f64,
    /// Extra presentation metadata (owner, tags)
    #[serde(default)]
    pub metadata: Value,
}

// ============================================================================
// CONFIDENCE REPORT
// ============================================================================

/// What the scorer suggests doing with the current result set.
///
/// Bands are fixed; retrieval escalation uses its own plan thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Confident enough to answer from the current tier
    Accept,
    /// Worth widening to the archive index
    EscalateArchive,
    /// Worth hydrating cold payloads
    FetchCold,
    /// Evidence too weak to rely on
    Uncertain,
}

impl Recommendation {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Accept => "accept",
            Recommendation::EscalateArchive => "escalate_archive",
            Recommendation::FetchCold => "fetch_cold",
            Recommendation::Uncertain => "uncertain",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quantified quality of a result set, with five weighted sub-scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Weighted blend of the five sub-scores, clamped to [0, 1]
    pub total: f64,
    /// Mean of the top result scores
    pub semantic_relevance: f64,
    /// Fraction of query tokens covered by top result texts
    pub coverage: f64,
    /// Recency of the top results
    pub temporal_fit: f64,
    /// Blend of authority and stability scalars
    pub authority: f64,
    /// Tag agreement across top results
    pub consistency: f64,
    /// Suggested next action
    pub recommendation: Recommendation,
}

// ============================================================================
// BUNDLE AND TRACE
// ============================================================================

/// Observability record of a retrieval pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalTrace {
    /// Pipeline stages that ran, in order
    pub steps: Vec<String>,
    /// Escalation decisions taken
    pub escalations: Vec<String>,
    /// `"{type}:{tier}"` provenance of the leading results
    pub sources: Vec<String>,
}

impl RetrievalTrace {
    /// Record a pipeline stage.
    pub fn add_step(&mut self, text: impl Into<String>) {
        self.steps.push(text.into());
    }

    /// Record an escalation decision.
    pub fn add_escalation(&mut self, text: impl Into<String>) {
        self.escalations.push(text.into());
    }
}

/// Everything `retrieve` hands back: ranked evidence plus how it got there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryBundle {
    /// The query text that produced this bundle
    pub query: String,
    /// Ranked, deduplicated results
    pub results: Vec<ScoredMemory>,
    /// Presentation blocks, one per result
    pub blocks: Vec<MemoryBlock>,
    /// Quantified quality of the result set
    pub confidence: ConfidenceReport,
    /// Tiers consulted, in consultation order
    pub used_tiers: Vec<StorageTier>,
    /// Pipeline trace for observability
    pub trace: RetrievalTrace,
    /// Non-fatal problems encountered (missing cold objects, stale pointers)
    #[serde(default)]
    pub warnings: Vec<String>,
}

// ============================================================================
// TESTS
// ============================================================================
