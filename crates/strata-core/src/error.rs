//! Error types shared across the engine.

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Caller passed something the engine cannot coerce or act on
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A storage capability failed outside the database/IO layers
    #[error("backend unavailable: {0}")]
    Backend(String),
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Blocking surface invoked while an async runtime is already driving
    /// this thread
    #[error("blocking API called inside an async runtime; use the async methods instead")]
    LoopMisuse,
}

/// Engine result type
pub type Result<T> = std::result::Result<T, MemoryError>;

// ============================================================================
// TESTS
// ============================================================================
