//! Confidence scoring
//!
//! Turns a result set into a [`ConfidenceReport`]: five weighted sub-scores
//! and a recommendation band. The retrieval orchestrator re-evaluates this
//! after every tier it consults; the total drives escalation.

use std::collections::HashSet;

use chrono::Utc;

use crate::memory::{ConfidenceReport, MemoryQuery, Recommendation, ScoredMemory};
use crate::text::{clamp_unit, safe_div, unique_tokens};

/// How many leading results feed each sub-score.
const TOP_N: usize = 5;

fn semantic_relevance(results: &[ScoredMemory]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let top: Vec<f64> = results.iter().take(TOP_N).map(|r| r.score).collect();
    top.iter().sum::<f64>() / top.len() as f64
}

fn coverage(query: &MemoryQuery, results: &[ScoredMemory]) -> f64 {
    let query_tokens = unique_tokens(&query.text);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let mut covered: HashSet<String> = HashSet::new();
    for result in results.iter().take(TOP_N) {
        covered.extend(unique_tokens(result.item.text()));
    }
    let hit = query_tokens.intersection(&covered).count();
    safe_div(hit as f64, query_tokens.len() as f64)
}

fn temporal_fit(results: &[ScoredMemory]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let now = Utc::now();
    let scores: Vec<f64> = results
        .iter()
        .take(TOP_N)
        .map(|result| {
            let age_days =
                ((now - result.item.created_at).num_seconds() as f64 / 86_400.0).max(0.0);
            1.0 / (1.0 + age_days)
        })
        .collect();
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn authority(results: &[ScoredMemory]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let scores: Vec<f64> = results
        .iter()
        .take(TOP_N)
        .map(|r| 0.5 * r.item.authority + 0.5 * r.item.stability)
        .collect();
    scores.iter().sum::<f64>() / scores.len() as f64
}

fn consistency(results: &[ScoredMemory]) -> f64 {
    if results.len() < 2 {
        return 0.5;
    }
    let tag_sets: Vec<HashSet<&String>> = results
        .iter()
        .take(TOP_N)
        .filter(|r| !r.item.tags.is_empty())
        .map(|r| r.item.tags.iter().collect())
        .collect();
    if tag_sets.is_empty() {
        return 0.4;
    }

    let mut intersection = tag_sets[0].clone();
    let mut union = tag_sets[0].clone();
    for set in &tag_sets[1..] {
        intersection.retain(|tag| set.contains(tag));
        union.extend(set.iter().copied());
    }
    safe_div(intersection.len() as f64, union.len() as f64)
}

/// Score a result set against its query.
pub fn evaluate_confidence(query: &MemoryQuery, results: &[ScoredMemory]) -> ConfidenceReport {
    let semantic = semantic_relevance(results);
    let coverage = coverage(query, results);
    let temporal = temporal_fit(results);
    let authority = authority(results);
    let consistency = consistency(results);

    let total = clamp_unit(
        0.35 * semantic + 0.20 * coverage + 0.20 * temporal + 0.15 * authority
            + 0.10 * consistency,
    );

    let recommendation = if total >= 0.75 {
        Recommendation::Accept
    } else if total >= 0.60 {
        Recommendation::EscalateArchive
    } else if total >= 0.45 {
        Recommendation::FetchCold
    } else {
        Recommendation::Uncertain
    };

    ConfidenceReport {
        total,
        semantic_relevance: semantic,
        coverage,
        temporal_fit: temporal,
        authority,
        consistency,
        recommendation,
    }
}

// ============================================================================
// TESTS
// ============================================================================
