//! Engine configuration
//!
//! Plain structs with sane local defaults. Relative paths resolve under a
//! data root (explicit, or the platform data directory).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

// ============================================================================
// RETRIEVAL PLAN
// ============================================================================

/// Budgets and thresholds driving the retrieval cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalPlan {
    /// Total hot-sweep budget, split across queried types
    pub hot_top_k: usize,
    /// Archive-index query budget
    pub archive_top_k: usize,
    /// Maximum cold payloads hydrated per retrieval
    pub cold_fetch_limit: usize,
    /// Minimum archive score for a cold-hydrate candidate
    pub cold_fetch_min_score: f64,
    /// Below this hot confidence, search the archive index
    pub hot_confidence: f64,
    /// Target confidence once archive results are merged
    pub archive_confidence: f64,
    /// Below this confidence, hydrate cold payloads
    pub cold_fetch_confidence: f64,
    /// Final result-count cap after rerank
    pub max_results: usize,
    /// Token budget hint for downstream context assembly
    pub max_context_tokens: usize,
}

impl Default for RetrievalPlan {
    fn default() -> Self {
        Self {
            hot_top_k: 30,
            archive_top_k: 30,
            cold_fetch_limit: 20,
            cold_fetch_min_score: 0.25,
            hot_confidence: 0.62,
            archive_confidence: 0.72,
            cold_fetch_confidence: 0.58,
            max_results: 50,
            max_context_tokens: 600,
        }
    }
}

// ============================================================================
// CONSOLIDATION CONFIG
// ============================================================================

/// Knobs for the consolidation pass run by `flush`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    /// Whether `flush` also runs the archiver
    pub archive_on_flush: bool,
    /// Tag-frequency threshold for synthesizing a semantic item
    pub semantic_min_count: usize,
    /// Cap on perceptual snippets joined into one highlight
    pub perceptual_summary_limit: usize,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            archive_on_flush: true,
            semantic_min_count: 2,
            perceptual_summary_limit: 5,
        }
    }
}

// ============================================================================
// SYSTEM CONFIG
// ============================================================================

/// System-wide configuration with local-mode defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Default TTL applied to working items that arrive without one
    pub working_ttl_seconds: u64,
    /// Retrieval budgets and thresholds
    pub retrieval_plan: RetrievalPlan,
    /// Consolidation knobs
    pub consolidation: ConsolidationConfig,
    /// Cold-item accesses before the rehydrator promotes back to hot
    pub rehydrate_access_threshold: u32,
    /// Embedding dimensionality for vector backends that need one
    pub vector_dim: usize,
    /// Select an embedding-backed vector index instead of the token index
    pub use_sqlite_vec: bool,
    /// Optional path to a native sqlite-vec extension
    pub sqlite_vec_extension_path: Option<PathBuf>,
    /// Root under which relative data paths resolve; platform data dir when unset
    pub data_root: Option<PathBuf>,
    /// Cold object store location
    pub cold_store_path: PathBuf,
    /// Metadata database location
    pub metadata_db_path: PathBuf,
    /// Feature database location
    pub feature_db_path: PathBuf,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            working_ttl_seconds: 3600,
            retrieval_plan: RetrievalPlan::default(),
            consolidation: ConsolidationConfig::default(),
            rehydrate_access_threshold: 3,
            vector_dim: 384,
            use_sqlite_vec: false,
            sqlite_vec_extension_path: None,
            data_root: None,
            cold_store_path: PathBuf::from("cold"),
            metadata_db_path: PathBuf::from("metadata.sqlite3"),
            feature_db_path: PathBuf::from("features.sqlite3"),
        }
    }
}

impl MemoryConfig {
    /// Config rooted at an explicit directory; handy for tests and embedded use.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        Self {
            data_root: Some(root.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Effective data root: explicit, else platform data dir, else cwd-relative.
    pub fn resolved_root(&self) -> PathBuf {
        if let Some(root) = &self.data_root {
            return root.clone();
        }
        match ProjectDirs::from("dev", "strata", "strata") {
            Some(dirs) => dirs.data_dir().to_path_buf(),
            None => PathBuf::from(".strata"),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.resolved_root().join(path)
        }
    }

    /// Resolved metadata database path.
    pub fn metadata_db(&self) -> PathBuf {
        self.resolve(&self.metadata_db_path)
    }

    /// Resolved feature database path.
    pub fn feature_db(&self) -> PathBuf {
        self.resolve(&self.feature_db_path)
    }

    /// Resolved root for cold object records.
    pub fn cold_records_root(&self) -> PathBuf {
        self.resolve(&self.cold_store_path).join("records")
    }
}

// ============================================================================
// TESTS
// ============================================================================
