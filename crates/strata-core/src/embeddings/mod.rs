//! Embedding collaborators
//!
//! The engine itself never calls a model; vector backends accept an
//! [`EmbeddingFn`] at construction. When no real model is wired in, the
//! deterministic [`hash_embedding`] fallback keeps the contract honest: the
//! same text always produces the same unit-length vector.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use crate::error::{MemoryError, Result};
use crate::text::tokenize;

/// Default embedding dimensionality for hash-based fallback vectors
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// An embedding backend: text in, fixed-width vector out.
pub type EmbeddingFn = Arc<dyn Fn(&str) -> Vec<f32> + Send + Sync>;

/// Deterministic bag-of-tokens embedding.
///
/// Each token is hashed into one of `dim` buckets and the resulting count
/// vector is L2-normalized. Not semantically meaningful, but stable and
/// dimension-correct, which is all the fallback contract requires.
pub fn hash_embedding(text: &str, dim: usize) -> Result<Vec<f32>> {
    if dim == 0 {
        return Err(MemoryError::InvalidInput(
            "embedding dimension must be positive".to_string(),
        ));
    }

    let mut vector = vec![0.0f32; dim];
    for token in tokenize(text) {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        let idx = (hasher.finish() % dim as u64) as usize;
        vector[idx] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm = if norm == 0.0 { 1.0 } else { norm };
    for v in &mut vector {
        *v /= norm;
    }
    Ok(vector)
}

/// Build an [`EmbeddingFn`] backed by [`hash_embedding`].
pub fn default_embedding_fn(dim: usize) -> Result<EmbeddingFn> {
    if dim == 0 {
        return Err(MemoryError::InvalidInput(
            "embedding dimension must be positive".to_string(),
        ));
    }
    Ok(Arc::new(move |text: &str| {
        // dim validated above, so the fallback cannot fail
        hash_embedding(text, dim).unwrap_or_else(|_| vec![0.0; dim])
    }))
}

/// Cosine similarity between two vectors (0.0 when shapes differ).
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}

// ============================================================================
// TESTS
// ============================================================================
