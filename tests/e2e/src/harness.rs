//! Test harness
//!
//! Isolated [`MemorySystem`] instances backed by a temporary directory, plus
//! small event factories for realistic inputs.

use strata_core::{MemoryConfig, MemoryEvent, MemorySystem, MemoryType};
use tempfile::TempDir;

/// A memory system rooted in its own temporary directory.
///
/// The directory (SQLite databases and cold records) is deleted when the
/// harness is dropped.
pub struct TestSystem {
    /// The system under test
    pub system: MemorySystem,
    /// Kept alive so the backing files survive the test body
    _temp_dir: TempDir,
}

impl TestSystem {
    /// Build a system with default config in a fresh temp directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let system = MemorySystem::new(MemoryConfig::rooted_at(temp_dir.path()))
            .expect("failed to build memory system");
        Self {
            system,
            _temp_dir: temp_dir,
        }
    }

    /// Build a system with a caller-tweaked config in a fresh temp directory.
    pub fn with_config(tweak: impl FnOnce(&mut MemoryConfig)) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let mut config = MemoryConfig::rooted_at(temp_dir.path());
        tweak(&mut config);
        let system = MemorySystem::new(config).expect("failed to build memory system");
        Self {
            system,
            _temp_dir: temp_dir,
        }
    }
}

impl Default for TestSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// An episodic event with tags and explicit confidence.
pub fn episodic_event(owner: &str, content: &str, tags: &[&str], confidence: f64) -> MemoryEvent {
    let mut event = MemoryEvent::text(MemoryType::Episodic, owner, content);
    event.tags = tags.iter().map(|t| t.to_string()).collect();
    event.confidence = confidence;
    event
}

/// A working-memory event (no TTL; the system defaults it).
pub fn working_event(owner: &str, content: &str, tags: &[&str]) -> MemoryEvent {
    let mut event = MemoryEvent::text(MemoryType::Working, owner, content);
    event.tags = tags.iter().map(|t| t.to_string()).collect();
    event
}

/// A perceptual event with explicit confidence.
pub fn perceptual_event(owner: &str, content: &str, tags: &[&str], confidence: f64) -> MemoryEvent {
    let mut event = MemoryEvent::text(MemoryType::Perceptual, owner, content);
    event.tags = tags.iter().map(|t| t.to_string()).collect();
    event.confidence = confidence;
    event
}
