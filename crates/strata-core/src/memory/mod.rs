//! Memory module - core types and data structures
//!
//! The canonical [`MemoryItem`], the developer-facing [`MemoryEvent`], and
//! the query/result shapes the retrieval pipeline speaks.

mod item;
mod query;

pub use item::{MemoryEvent, MemoryItem, MemoryType, StorageTier, WriteInput};
pub use query::{
    ConfidenceReport, MemoryBlock, MemoryBundle, MemoryQuery, Recommendation, RetrievalTrace,
    ScoredMemory,
};
