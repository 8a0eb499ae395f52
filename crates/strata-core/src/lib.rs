//! # Strata Core
//!
//! Tiered memory engine for conversational agents. Heterogeneous memory
//! events (working context, episodic turns, semantic facts, perceptual
//! summaries) are routed across three storage tiers and queried back as
//! ranked, deduplicated evidence with a quantified confidence report.
//!
//! - **Tiered data model**: `hot` (fully indexed) ↔ `archive_index`
//!   (summary-only) ↔ `cold` (content in the object store)
//! - **Write routing**: confidence-gated fan-out into metadata, vector,
//!   feature, and graph backends
//! - **Confidence-gated retrieval**: hot sweep, archive escalation, cold
//!   hydration, then dedup and rerank
//! - **Workers**: consolidation, archiver, rehydrator, compactor, all run
//!   from explicit `flush`/`rehydrate` calls
//! - **Pluggable backends**: five capability traits with SQLite, file, and
//!   in-process reference implementations
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use strata_core::{MemoryConfig, MemoryEvent, MemorySystem, MemoryType};
//!
//! # async fn demo() -> strata_core::Result<()> {
//! let system = MemorySystem::new(MemoryConfig::rooted_at("./data"))?;
//!
//! let mut event = MemoryEvent::text(
//!     MemoryType::Episodic,
//!     "user-1",
//!     "EU carbon border adjustment discussed",
//! );
//! event.tags = vec!["eu".into(), "policy".into()];
//! event.confidence = 0.7;
//! system.write(event).await?;
//!
//! let bundle = system.retrieve_text("What about EU carbon policy?", "user-1").await?;
//! println!("{} blocks, confidence {:.2}", bundle.blocks.len(), bundle.confidence.total);
//!
//! system.flush("user-1").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Synchronous scripts can use the `*_blocking` twins of every facade method;
//! they refuse to run inside an active async runtime instead of deadlocking it.

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod confidence;
pub mod embeddings;
pub mod error;
pub mod indexers;
pub mod memory;
pub mod policy;
pub mod retrieval;
pub mod storage;
pub mod system;
pub mod text;
pub mod workers;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Data model
pub use memory::{
    ConfidenceReport, MemoryBlock, MemoryBundle, MemoryEvent, MemoryItem, MemoryQuery, MemoryType,
    Recommendation, RetrievalTrace, ScoredMemory, StorageTier, WriteInput,
};

// Errors
pub use error::{MemoryError, Result};

// Configuration
pub use config::{ConsolidationConfig, MemoryConfig, RetrievalPlan};

// Capability interfaces and reference backends
pub use storage::{
    FeatureStore, FileObjectStore, GraphStore, InMemoryGraphStore, IndexFilter, IndexRecord,
    MetadataStore, ObjectStore, SqliteFeatureStore, SqliteMetadataStore, TokenVectorIndex,
    VectorIndex,
};

// Indexers
pub use indexers::{EpisodicIndexer, PerceptualIndexer, SemanticGraphIndexer};

// Policies
pub use policy::{
    ConversationMemoryPolicy, HeuristicMemoryPolicy, HistoryTurn, MemoryDecision, RoutingDecision,
    RoutingPolicy,
};

// Confidence scoring
pub use confidence::evaluate_confidence;

// Retrieval
pub use retrieval::RetrievalOrchestrator;

// Workers
pub use workers::{ArchiverWorker, Compactor, ConsolidationWorker, RehydratorWorker};

// Facade
pub use system::{MemoryMetrics, MemorySystem, MemorySystemBuilder};

// Embedding collaborators
pub use embeddings::{
    cosine_similarity, default_embedding_fn, hash_embedding, EmbeddingFn, DEFAULT_EMBEDDING_DIM,
};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        MemoryBundle, MemoryConfig, MemoryError, MemoryEvent, MemoryItem, MemoryQuery,
        MemorySystem, MemoryType, Result, StorageTier,
    };
}
