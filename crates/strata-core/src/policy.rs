//! Write-path policies
//!
//! [`RoutingPolicy`] decides which backends a write touches, as a pure
//! function of the item. [`ConversationMemoryPolicy`] sits one level up: it
//! decides whether a conversation turn is worth storing at all, and the
//! engine consumes its output as an ordinary [`MemoryEvent`].

use crate::memory::{MemoryEvent, MemoryItem, MemoryType};
use crate::text::tokenize;

// ============================================================================
// ROUTING POLICY
// ============================================================================

/// Which backends a write should touch.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// Persist the canonical record in the metadata store
    pub write_hot: bool,
    /// Index full text in the vector index
    pub write_vector: bool,
    /// Log features for perceptual input
    pub write_features: bool,
    /// Eligible for archival to cold on flush
    pub archive_cold: bool,
    /// Reasons for the negative branches
    pub reasons: Vec<String>,
}

/// Confidence-gated routing thresholds.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    /// Minimum confidence to keep an item at all
    pub hot_min_confidence: f64,
    /// Minimum confidence to archive to cold
    pub cold_min_confidence: f64,
    /// Minimum confidence to vector-index
    pub vector_min_confidence: f64,
    /// Minimum confidence for perceptual feature logging
    pub feature_min_confidence: f64,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            hot_min_confidence: 0.40,
            cold_min_confidence: 0.55,
            vector_min_confidence: 0.50,
            feature_min_confidence: 0.45,
        }
    }
}

impl RoutingPolicy {
    /// Route an item. Pure; graph extraction is not gated here because the
    /// semantic indexer filters on its own.
    pub fn route(&self, item: &MemoryItem) -> RoutingDecision {
        let mut reasons = Vec::new();
        let confidence = item.confidence;

        let write_hot = confidence >= self.hot_min_confidence;
        if !write_hot {
            reasons.push("low_confidence_hot".to_string());
        }

        let write_vector =
            confidence >= self.vector_min_confidence && item.memory_type != MemoryType::Working;
        if !write_vector {
            reasons.push("skip_vector".to_string());
        }

        let write_features = item.memory_type == MemoryType::Perceptual
            && confidence >= self.feature_min_confidence;
        if !write_features && item.memory_type == MemoryType::Perceptual {
            reasons.push("skip_features".to_string());
        }

        let archive_cold = matches!(
            item.memory_type,
            MemoryType::Episodic | MemoryType::Semantic | MemoryType::Perceptual
        ) && confidence >= self.cold_min_confidence;
        if !archive_cold {
            reasons.push("skip_cold".to_string());
        }

        RoutingDecision {
            write_hot,
            write_vector,
            write_features,
            archive_cold,
            reasons,
        }
    }
}

// ============================================================================
// CONVERSATION MEMORY POLICY
// ============================================================================

/// One prior turn of conversation history.
#[derive(Debug, Clone)]
pub enum HistoryTurn {
    /// Free-form transcript text
    Text(String),
    /// A full user/assistant exchange
    Exchange {
        /// What the user said
        user: String,
        /// What the assistant replied
        assistant: String,
    },
}

impl HistoryTurn {
    fn text(&self) -> String {
        match self {
            HistoryTurn::Text(text) => text.clone(),
            HistoryTurn::Exchange { user, assistant } => {
                format!("User: {user} Assistant: {assistant}")
            }
        }
    }
}

/// A store/skip verdict for one conversation turn.
#[derive(Debug, Clone)]
pub struct MemoryDecision {
    /// Whether the turn should be persisted
    pub store: bool,
    /// Memory type to store it under
    pub memory_type: MemoryType,
    /// Summary to store
    pub summary: Option<String>,
    /// Tags to attach
    pub tags: Vec<String>,
    /// Signals that fired while deciding
    pub reasons: Vec<String>,
}

/// Decides whether a conversation turn is worth remembering.
pub trait ConversationMemoryPolicy {
    /// Judge one turn against recent history.
    fn should_store(
        &self,
        owner: &str,
        history: &[HistoryTurn],
        user_message: &str,
        assistant_message: &str,
    ) -> MemoryDecision;

    /// Convert a positive decision into a write-ready event.
    fn to_event(&self, owner: &str, decision: &MemoryDecision) -> Option<MemoryEvent> {
        if !decision.store {
            return None;
        }
        let summary = decision.summary.clone()?;
        let mut event = MemoryEvent::text(decision.memory_type, owner, summary);
        event.tags = decision.tags.clone();
        Some(event)
    }
}

/// Default heuristic: skip short or repetitive turns, always keep preferences.
#[derive(Debug, Clone)]
pub struct HeuristicMemoryPolicy {
    /// Turns shorter than this are skipped unless highly novel
    pub min_tokens: usize,
    /// Novelty floor for normal-length turns
    pub novelty_threshold: f64,
    /// Stricter novelty floor for short turns
    pub short_turn_min_novelty: f64,
    /// Lower-cased keywords that mark a preference statement
    pub preference_keywords: Vec<String>,
}

impl Default for HeuristicMemoryPolicy {
    fn default() -> Self {
        Self {
            min_tokens: 24,
            novelty_threshold: 0.65,
            short_turn_min_novelty: 0.8,
            preference_keywords: ["prefer", "always", "never", "likes", "dislikes"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl HeuristicMemoryPolicy {
    fn overlap_ratio(tokens_a: &[String], tokens_b: &[String]) -> f64 {
        if tokens_a.is_empty() || tokens_b.is_empty() {
            return 0.0;
        }
        let set_a: std::collections::HashSet<&String> = tokens_a.iter().collect();
        let set_b: std::collections::HashSet<&String> = tokens_b.iter().collect();
        let intersection = set_a.intersection(&set_b).count();
        let union = set_a.union(&set_b).count();
        intersection as f64 / union.max(1) as f64
    }

    fn summarize(user_message: &str, assistant_message: &str, memory_type: MemoryType) -> String {
        if memory_type == MemoryType::Semantic {
            format!("User preference: {}", user_message.trim())
        } else {
            format!(
                "User asked: {} | Assistant replied: {}",
                user_message.trim(),
                assistant_message.trim()
            )
        }
    }
}

impl ConversationMemoryPolicy for HeuristicMemoryPolicy {
    fn should_store(
        &self,
        _owner: &str,
        history: &[HistoryTurn],
        user_message: &str,
        assistant_message: &str,
    ) -> MemoryDecision {
        let combined = format!("{user_message} {assistant_message}");
        let tokens = tokenize(&combined);
        let mut reasons = Vec::new();
        let mut memory_type = MemoryType::Episodic;

        let combined_lower = combined.to_lowercase();
        let is_preference = self
            .preference_keywords
            .iter()
            .any(|keyword| combined_lower.contains(keyword));

        if tokens.len() < self.min_tokens {
            reasons.push("short_turn".to_string());
        }
        if is_preference {
            memory_type = MemoryType::Semantic;
            reasons.push("preference_signal".to_string());
        }

        if !history.is_empty() {
            let recent = history.iter().rev().take(3).rev();
            let recent_text = recent.map(|turn| turn.text()).collect::<Vec<_>>().join(" ");
            let novelty = 1.0 - Self::overlap_ratio(&tokens, &tokenize(&recent_text));
            let novelty_floor = if tokens.len() < self.min_tokens {
                self.short_turn_min_novelty
            } else {
                self.novelty_threshold
            };
            if novelty < novelty_floor {
                reasons.push("low_novelty".to_string());
            }
        }

        let store = if is_preference {
            true
        } else {
            !reasons.iter().any(|r| r == "short_turn" || r == "low_novelty")
        };

        MemoryDecision {
            store,
            memory_type,
            summary: Some(Self::summarize(user_message, assistant_message, memory_type)),
            tags: vec!["conversation".to_string(), memory_type.as_str().to_string()],
            reasons,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
