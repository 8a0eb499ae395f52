//! Memory items - the canonical records of the engine
//!
//! Every piece of remembered context is a [`MemoryItem`]: typed, owned by a
//! single owner string, and placed in exactly one storage tier. Developer
//! input arrives as a [`MemoryEvent`] (or a raw JSON map) and is coerced into
//! an item before anything touches storage.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{MemoryError, Result};
use crate::text::clamp_unit;

// ============================================================================
// TYPE AND TIER ENUMS
// ============================================================================

/// Kind of memory an item holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    /// Short-lived working context (expires via TTL)
    #[default]
    Working,
    /// Conversation turns and session events
    Episodic,
    /// Distilled facts and preferences
    Semantic,
    /// Summaries of perceptual input (images, audio, sensors)
    Perceptual,
}

impl MemoryType {
    /// All memory types, in retrieval sweep order
    pub const ALL: [MemoryType; 4] = [
        MemoryType::Working,
        MemoryType::Episodic,
        MemoryType::Semantic,
        MemoryType::Perceptual,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Working => "working",
            MemoryType::Episodic => "episodic",
            MemoryType::Semantic => "semantic",
            MemoryType::Perceptual => "perceptual",
        }
    }
}

impl std::fmt::Display for MemoryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MemoryType {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "working" => Ok(MemoryType::Working),
            "episodic" => Ok(MemoryType::Episodic),
            "semantic" => Ok(MemoryType::Semantic),
            "perceptual" => Ok(MemoryType::Perceptual),
            other => Err(MemoryError::InvalidInput(format!(
                "unknown memory type: {other}"
            ))),
        }
    }
}

/// Physical locality class of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageTier {
    /// Fully indexed, full content available
    #[default]
    Hot,
    /// Content offloaded to the object store
    Cold,
    /// Summary-only vector entry pointing at cold content
    ArchiveIndex,
}

impl StorageTier {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTier::Hot => "hot",
            StorageTier::Cold => "cold",
            StorageTier::ArchiveIndex => "archive_index",
        }
    }
}

impl std::fmt::Display for StorageTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StorageTier {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "hot" => Ok(StorageTier::Hot),
            "cold" => Ok(StorageTier::Cold),
            "archive_index" => Ok(StorageTier::ArchiveIndex),
            other => Err(MemoryError::InvalidInput(format!(
                "unknown storage tier: {other}"
            ))),
        }
    }
}

// ============================================================================
// MEMORY ITEM
// ============================================================================

/// Canonical memory record held by the metadata store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Unique identifier (UUID v4)
    pub id: Uuid,
    /// Kind of memory
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    /// Opaque owner scope; queries never cross owners
    pub owner: String,
    /// Short human-readable summary, never empty
    pub summary: String,
    /// Optional payload: plain string, structured object, or list of turns
    #[serde(default)]
    pub content: Option<Value>,
    /// Ordered categorization tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the item was created
    pub created_at: DateTime<Utc>,
    /// When the item was last modified
    pub updated_at: DateTime<Utc>,
    /// When the item was last read back
    #[serde(default)]
    pub last_accessed: Option<DateTime<Utc>>,
    /// Current storage tier
    #[serde(default)]
    pub tier: StorageTier,
    /// Opaque pointers; `object_key` and `archive_key` appear after archival
    #[serde(default)]
    pub pointer: BTreeMap<String, String>,
    /// Time-to-live; working items get a default from config
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    /// How much the producer trusts this item (0-1)
    pub confidence: f64,
    /// How authoritative the source is (0-1)
    pub authority: f64,
    /// How slowly this fact is expected to change (0-1)
    pub stability: f64,
}

impl MemoryItem {
    /// Create a new hot item with default scalars.
    pub fn new(
        memory_type: MemoryType,
        owner: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            memory_type,
            owner: owner.into(),
            summary: summary.into(),
            content: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            last_accessed: None,
            tier: StorageTier::Hot,
            pointer: BTreeMap::new(),
            ttl_seconds: None,
            confidence: 0.5,
            authority: 0.5,
            stability: 0.5,
        }
    }

    /// Text used for indexing and presentation: the content if it is a plain
    /// string, the summary otherwise.
    pub fn text(&self) -> &str {
        match &self.content {
            Some(Value::String(s)) => s,
            _ => &self.summary,
        }
    }

    /// True once the TTL window has fully elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.ttl_seconds {
            None => false,
            Some(ttl) => self.created_at + Duration::seconds(ttl as i64) <= now,
        }
    }
}

// ============================================================================
// MEMORY EVENT
// ============================================================================

fn default_scalar() -> f64 {
    0.5
}

/// Developer-facing write input.
///
/// Content is mandatory; the summary defaults to the content itself (its JSON
/// form when the content is structured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    /// Payload to remember
    pub content: Value,
    /// Kind of memory (defaults to working)
    #[serde(rename = "type", default)]
    pub memory_type: MemoryType,
    /// Owner scope
    pub owner: String,
    /// Optional short summary
    #[serde(default)]
    pub summary: Option<String>,
    /// Categorization tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional time-to-live
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    /// Producer confidence (0-1)
    #[serde(default = "default_scalar")]
    pub confidence: f64,
    /// Source authority (0-1)
    #[serde(default = "default_scalar")]
    pub authority: f64,
    /// Expected stability (0-1)
    #[serde(default = "default_scalar")]
    pub stability: f64,
    /// Opaque pointers carried through to the item
    #[serde(default)]
    pub pointer: BTreeMap<String, String>,
}

impl MemoryEvent {
    /// Create an event from plain text content.
    pub fn text(memory_type: MemoryType, owner: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: Value::String(content.into()),
            memory_type,
            owner: owner.into(),
            summary: None,
            tags: Vec::new(),
            ttl_seconds: None,
            confidence: 0.5,
            authority: 0.5,
            stability: 0.5,
            pointer: BTreeMap::new(),
        }
    }

    /// Coerce into the canonical item shape, defaulting the summary and
    /// clamping scalars into the unit interval.
    pub fn to_item(&self) -> MemoryItem {
        let summary = match self.summary.as_deref() {
            Some(s) if !s.trim().is_empty() => s.to_string(),
            _ => match &self.content {
                Value::String(s) if !s.is_empty() => s.clone(),
                other => other.to_string(),
            },
        };

        let mut item = MemoryItem::new(self.memory_type, self.owner.clone(), summary);
        item.content = Some(self.content.clone());
        item.tags = self.tags.clone();
        item.ttl_seconds = self.ttl_seconds;
        item.pointer = self.pointer.clone();
        item.confidence = clamp_unit(self.confidence);
        item.authority = clamp_unit(self.authority);
        item.stability = clamp_unit(self.stability);
        item
    }
}

// ============================================================================
// WRITE INPUT COERCION
// ============================================================================

/// The three accepted shapes of a `write` call.
#[derive(Debug, Clone)]
pub enum WriteInput {
    /// A structured developer event
    Event(MemoryEvent),
    /// An already-canonical item, stored as-is
    Canonical(MemoryItem),
    /// A raw JSON map, deserialized through [`MemoryEvent`]
    Raw(Value),
}

impl WriteInput {
    /// Resolve to a canonical item, rejecting shapes that cannot coerce.
    pub fn into_item(self) -> Result<MemoryItem> {
        match self {
            WriteInput::Event(event) => {
                if event.owner.trim().is_empty() {
                    return Err(MemoryError::InvalidInput(
                        "memory event requires a non-empty owner".to_string(),
                    ));
                }
                Ok(event.to_item())
            }
            WriteInput::Canonical(item) => {
                if item.owner.trim().is_empty() {
                    return Err(MemoryError::InvalidInput(
                        "memory item requires a non-empty owner".to_string(),
                    ));
                }
                Ok(item)
            }
            WriteInput::Raw(value) => {
                if !value.is_object() {
                    return Err(MemoryError::InvalidInput(
                        "raw write payload must be a JSON object".to_string(),
                    ));
                }
                let event: MemoryEvent = serde_json::from_value(value).map_err(|e| {
                    MemoryError::InvalidInput(format!("cannot coerce raw payload: {e}"))
                })?;
                WriteInput::Event(event).into_item()
            }
        }
    }
}

impl From<MemoryEvent> for WriteInput {
    fn from(event: MemoryEvent) -> Self {
        WriteInput::Event(event)
    }
}

impl From<MemoryItem> for WriteInput {
    fn from(item: MemoryItem) -> Self {
        WriteInput::Canonical(item)
    }
}

impl From<Value> for WriteInput {
    fn from(value: Value) -> Self {
        WriteInput::Raw(value)
    }
}

// ============================================================================
// TESTS
// ============================================================================
