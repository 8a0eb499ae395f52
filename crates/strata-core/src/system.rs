//! Memory system facade
//!
//! Wires backends, indexers, policies, retrieval, and workers into one entry
//! point. The async methods are the primary surface; each has a `*_blocking`
//! twin that refuses to run inside an already-active runtime and otherwise
//! drives the call on a fresh current-thread runtime.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MemoryConfig;
use crate::error::{MemoryError, Result};
use crate::indexers::{EpisodicIndexer, PerceptualIndexer, SemanticGraphIndexer};
use crate::memory::{MemoryBundle, MemoryItem, MemoryQuery, MemoryType, StorageTier, WriteInput};
use crate::policy::RoutingPolicy;
use crate::retrieval::RetrievalOrchestrator;
use crate::storage::{
    FeatureStore, FileObjectStore, GraphStore, InMemoryGraphStore, MetadataStore, ObjectStore,
    SqliteFeatureStore, SqliteMetadataStore, TokenVectorIndex, VectorIndex,
};
use crate::text::tokenize;
use crate::workers::{ArchiverWorker, Compactor, ConsolidationWorker, RehydratorWorker};

// ============================================================================
// METRICS
// ============================================================================

/// Operation counters maintained by the facade.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetrics {
    /// Retrieval requests served
    pub requests: u64,
    /// Retrievals answered with hot as the first tier
    pub hot_hits: u64,
    /// Retrievals that widened to the archive index
    pub archive_escalations: u64,
    /// Retrievals that hydrated cold payloads
    pub cold_fetches: u64,
    /// Rehydration passes that promoted at least one item
    pub thrash_detected: u64,
    /// Tokens handed back across all bundles
    pub tokens_returned: u64,
    /// Tokens avoided versus a naive full-budget return
    pub tokens_saved_estimate: u64,
}

// ============================================================================
// BUILDER
// ============================================================================

/// Injects backends into a [`MemorySystem`]; anything not supplied falls back
/// to the local-mode reference implementation.
pub struct MemorySystemBuilder {
    config: MemoryConfig,
    metadata: Option<Arc<dyn MetadataStore>>,
    index: Option<Arc<dyn VectorIndex>>,
    graph: Option<Arc<dyn GraphStore>>,
    objects: Option<Arc<dyn ObjectStore>>,
    features: Option<Arc<dyn FeatureStore>>,
    routing: Option<RoutingPolicy>,
}

impl MemorySystemBuilder {
    /// Start a builder from a config.
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            metadata: None,
            index: None,
            graph: None,
            objects: None,
            features: None,
            routing: None,
        }
    }

    /// Inject a metadata store.
    pub fn metadata_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.metadata = Some(store);
        self
    }

    /// Inject a vector index.
    pub fn vector_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Inject a graph store.
    pub fn graph_store(mut self, graph: Arc<dyn GraphStore>) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Inject an object store.
    pub fn object_store(mut self, objects: Arc<dyn ObjectStore>) -> Self {
        self.objects = Some(objects);
        self
    }

    /// Inject a feature store.
    pub fn feature_store(mut self, features: Arc<dyn FeatureStore>) -> Self {
        self.features = Some(features);
        self
    }

    /// Override the routing policy.
    pub fn routing_policy(mut self, routing: RoutingPolicy) -> Self {
        self.routing = Some(routing);
        self
    }

    /// Construct the system, opening reference backends for anything missing.
    pub fn build(self) -> Result<MemorySystem> {
        let config = self.config;

        let metadata: Arc<dyn MetadataStore> = match self.metadata {
            Some(store) => store,
            None => Arc::new(SqliteMetadataStore::new(config.metadata_db())?),
        };
        let index: Arc<dyn VectorIndex> = match self.index {
            Some(index) => index,
            None if config.use_sqlite_vec => {
                return Err(MemoryError::Backend(
                    "use_sqlite_vec is set but no vector index was injected".to_string(),
                ));
            }
            None => Arc::new(TokenVectorIndex::new()),
        };
        let graph: Arc<dyn GraphStore> = match self.graph {
            Some(graph) => graph,
            None => Arc::new(InMemoryGraphStore::new()),
        };
        let objects: Arc<dyn ObjectStore> = match self.objects {
            Some(objects) => objects,
            None => Arc::new(FileObjectStore::new(config.cold_records_root())?),
        };
        let features: Arc<dyn FeatureStore> = match self.features {
            Some(features) => features,
            None => Arc::new(SqliteFeatureStore::new(config.feature_db())?),
        };

        let routing = self.routing.unwrap_or_default();

        let retrieval = RetrievalOrchestrator::new(
            metadata.clone(),
            index.clone(),
            objects.clone(),
            config.retrieval_plan.clone(),
        );
        let consolidation = ConsolidationWorker::new(
            metadata.clone(),
            index.clone(),
            config.consolidation.clone(),
        );
        let archiver = ArchiverWorker::new(metadata.clone(), objects.clone(), index.clone());
        let rehydrator = RehydratorWorker::new(
            metadata.clone(),
            index.clone(),
            config.rehydrate_access_threshold,
        );
        let compactor = Compactor::new(metadata.clone());

        info!(
            working_ttl_seconds = config.working_ttl_seconds,
            "memory system ready"
        );

        Ok(MemorySystem {
            episodic_indexer: EpisodicIndexer::new(index.clone()),
            semantic_indexer: SemanticGraphIndexer::new(graph.clone()),
            perceptual_indexer: PerceptualIndexer::new(features.clone()),
            config,
            metadata,
            index,
            graph,
            objects,
            features,
            routing,
            retrieval,
            consolidation,
            archiver,
            rehydrator,
            compactor,
            metrics: Mutex::new(MemoryMetrics::default()),
        })
    }
}

// ============================================================================
// MEMORY SYSTEM
// ============================================================================

/// Entry point for the memory engine with local-mode defaults.
pub struct MemorySystem {
    config: MemoryConfig,
    metadata: Arc<dyn MetadataStore>,
    index: Arc<dyn VectorIndex>,
    graph: Arc<dyn GraphStore>,
    objects: Arc<dyn ObjectStore>,
    features: Arc<dyn FeatureStore>,
    episodic_indexer: EpisodicIndexer,
    semantic_indexer: SemanticGraphIndexer,
    perceptual_indexer: PerceptualIndexer,
    routing: RoutingPolicy,
    retrieval: RetrievalOrchestrator,
    consolidation: ConsolidationWorker,
    archiver: ArchiverWorker,
    rehydrator: RehydratorWorker,
    compactor: Compactor,
    metrics: Mutex<MemoryMetrics>,
}

/// Drive a future to completion outside any ambient runtime.
fn block_on<T>(future: impl Future<Output = Result<T>>) -> Result<T> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(MemoryError::LoopMisuse);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}

impl MemorySystem {
    /// Build a system with reference backends from a config.
    pub fn new(config: MemoryConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start a builder to inject custom backends.
    pub fn builder(config: MemoryConfig) -> MemorySystemBuilder {
        MemorySystemBuilder::new(config)
    }

    // ── Write path ────────────────────────────────────────────────────────

    /// Persist one memory event (event, canonical item, or raw JSON map).
    ///
    /// Working items without a TTL receive the configured default. The
    /// routing decision controls the backend fan-out; semantic graph
    /// extraction runs unconditionally and filters internally.
    pub async fn write(&self, input: impl Into<WriteInput>) -> Result<MemoryItem> {
        let mut item = input.into().into_item()?;
        if item.memory_type == MemoryType::Working && item.ttl_seconds.is_none() {
            item.ttl_seconds = Some(self.config.working_ttl_seconds);
        }

        let decision = self.routing.route(&item);
        debug!(
            owner = %item.owner,
            id = %item.id,
            memory_type = %item.memory_type,
            write_hot = decision.write_hot,
            write_vector = decision.write_vector,
            write_features = decision.write_features,
            "routing memory write"
        );

        if decision.write_hot {
            self.metadata.upsert(&item).await?;
        }
        if decision.write_vector {
            self.episodic_indexer.index_hot(&item).await?;
        }
        if decision.write_features {
            self.perceptual_indexer.index(&item).await?;
        }
        self.semantic_indexer.index(&item).await?;
        Ok(item)
    }

    /// Blocking form of [`write`](Self::write).
    pub fn write_blocking(&self, input: impl Into<WriteInput>) -> Result<MemoryItem> {
        let input = input.into();
        block_on(self.write(input))
    }

    /// Persist an event as perceptual memory regardless of its declared type.
    pub async fn write_perceptual(&self, input: impl Into<WriteInput>) -> Result<MemoryItem> {
        let mut item = input.into().into_item()?;
        item.memory_type = MemoryType::Perceptual;

        let decision = self.routing.route(&item);
        if decision.write_hot {
            self.metadata.upsert(&item).await?;
        }
        if decision.write_vector {
            self.episodic_indexer.index_hot(&item).await?;
        }
        if decision.write_features {
            self.perceptual_indexer.index(&item).await?;
        }
        Ok(item)
    }

    /// Blocking form of [`write_perceptual`](Self::write_perceptual).
    pub fn write_perceptual_blocking(&self, input: impl Into<WriteInput>) -> Result<MemoryItem> {
        let input = input.into();
        block_on(self.write_perceptual(input))
    }

    // ── Read path ─────────────────────────────────────────────────────────

    /// Run the retrieval cascade for a query.
    pub async fn retrieve(&self, query: MemoryQuery) -> Result<MemoryBundle> {
        if query.owner.trim().is_empty() {
            return Err(MemoryError::InvalidInput(
                "query requires a non-empty owner".to_string(),
            ));
        }
        let bundle = self.retrieval.retrieve(&query).await?;
        self.note_retrieval(&bundle);
        Ok(bundle)
    }

    /// Convenience form taking free text and an owner.
    pub async fn retrieve_text(&self, text: &str, owner: &str) -> Result<MemoryBundle> {
        self.retrieve(MemoryQuery::new(text, owner)).await
    }

    /// Blocking form of [`retrieve`](Self::retrieve).
    pub fn retrieve_blocking(&self, query: MemoryQuery) -> Result<MemoryBundle> {
        block_on(self.retrieve(query))
    }

    /// Blocking form of [`retrieve_text`](Self::retrieve_text).
    pub fn retrieve_text_blocking(&self, text: &str, owner: &str) -> Result<MemoryBundle> {
        block_on(self.retrieve_text(text, owner))
    }

    // ── Workers ───────────────────────────────────────────────────────────

    /// Consolidate, optionally archive, then compact one owner's memory.
    /// Returns the newly consolidated items.
    pub async fn flush(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        let new_items = self.consolidation.run_once(owner).await?;
        if self.config.consolidation.archive_on_flush {
            self.archiver.run_once(owner).await?;
        }
        self.compactor.run_once(owner).await?;
        Ok(new_items)
    }

    /// Blocking form of [`flush`](Self::flush).
    pub fn flush_blocking(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        block_on(self.flush(owner))
    }

    /// Count an access: bumps the rehydrator counter and `last_accessed`.
    pub async fn record_access(&self, id: Uuid) -> Result<()> {
        self.rehydrator.record_access(id)?;
        self.metadata.update_access(id).await
    }

    /// Blocking form of [`record_access`](Self::record_access).
    pub fn record_access_blocking(&self, id: Uuid) -> Result<()> {
        block_on(self.record_access(id))
    }

    /// Promote cold items under access pressure back to hot.
    pub async fn rehydrate(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        let warmed = self.rehydrator.run_once(owner).await?;
        if !warmed.is_empty() {
            if let Ok(mut metrics) = self.metrics.lock() {
                metrics.thrash_detected += 1;
            }
        }
        Ok(warmed)
    }

    /// Blocking form of [`rehydrate`](Self::rehydrate).
    pub fn rehydrate_blocking(&self, owner: &str) -> Result<Vec<MemoryItem>> {
        block_on(self.rehydrate(owner))
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// Snapshot of the operation counters.
    pub fn metrics(&self) -> MemoryMetrics {
        self.metrics
            .lock()
            .map(|metrics| metrics.clone())
            .unwrap_or_default()
    }

    /// The active configuration.
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// The metadata store backing this system.
    pub fn metadata_store(&self) -> &Arc<dyn MetadataStore> {
        &self.metadata
    }

    /// The vector index backing this system.
    pub fn vector_index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// The graph store backing this system.
    pub fn graph_store(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    /// The object store backing this system.
    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    /// The feature store backing this system.
    pub fn feature_store(&self) -> &Arc<dyn FeatureStore> {
        &self.features
    }

    fn note_retrieval(&self, bundle: &MemoryBundle) {
        let returned: u64 = bundle
            .blocks
            .iter()
            .map(|block| tokenize(&block.text).len() as u64)
            .sum();
        let baseline = (self.config.retrieval_plan.max_results * 50) as u64;

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.requests += 1;
            if bundle.used_tiers.first() == Some(&StorageTier::Hot) {
                metrics.hot_hits += 1;
            }
            if bundle.used_tiers.contains(&StorageTier::ArchiveIndex) {
                metrics.archive_escalations += 1;
            }
            if bundle.used_tiers.contains(&StorageTier::Cold) {
                metrics.cold_fetches += 1;
            }
            metrics.tokens_returned += returned;
            metrics.tokens_saved_estimate += baseline.saturating_sub(returned);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
