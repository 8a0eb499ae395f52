//! Shared text utilities
//!
//! One tokenization rule is used everywhere: the confidence scorer, the
//! in-process token index, the conversation policy, and the token accounting
//! in the facade all agree on what a "token" is.

use std::collections::HashSet;

/// Split text into lower-cased tokens.
///
/// A token is a maximal run of ASCII alphanumerics or apostrophes.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || ch == '\'' {
            current.push(ch.to_ascii_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Tokenize and deduplicate.
pub fn unique_tokens(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// Division that treats a zero denominator as zero.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Clamp a score into the unit interval.
pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

// ============================================================================
// TESTS
// ============================================================================
