//! Similarity ranker: brute-force cosine scan with per-document
//! diversification.
//!
//! Pure computation over rows already loaded from the store; no model
//! or network calls happen here. Callers embed the query first.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::RetrievalCandidate;

/// A ranked retrieval result handed to the chat layer as grounding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub document_id: String,
    pub document_name: String,
    pub text: String,
    pub similarity: f32,
}

/// Cosine similarity of two vectors. Returns 0.0 when either vector is
/// empty, zero-magnitude, or the lengths disagree, so chunks whose
/// embedding attempt failed can never be retrieved.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Score, threshold, and diversify the candidate chunks against a
/// query vector.
///
/// Chunks whose embedding attempt failed (empty or zero-magnitude
/// vectors) never enter the candidate pool, not even under the
/// fallback. Chunks below `threshold` are dropped, unless that would
/// drop every chunk, in which case the threshold is ignored entirely
/// and raw scores decide (the caller always gets some grounding
/// whenever a healthy chunk exists). Selection
/// then spreads slots across documents: one chunk per document first,
/// remaining slots filled down the score order up to
/// `max_per_document` chunks from any single document.
///
/// Results come back in selection order, which after diversification
/// is not a strict score order.
pub fn search(
    query: &[f32],
    candidates: &[RetrievalCandidate],
    limit: usize,
    threshold: f32,
    max_per_document: usize,
) -> Vec<Citation> {
    if limit == 0 || candidates.is_empty() {
        return Vec::new();
    }
    // Degenerate query vector: no meaningful ranking exists.
    if query.is_empty() || query.iter().all(|v| *v == 0.0) {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f32)> = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.chunk.vector.iter().any(|v| *v != 0.0))
        .map(|(idx, candidate)| (idx, cosine_similarity(query, &candidate.chunk.vector)))
        .collect();

    // Stable sort keeps store order for equal scores.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let passing: Vec<(usize, f32)> = scored
        .iter()
        .copied()
        .filter(|(_, score)| *score >= threshold)
        .collect();

    let pool = if passing.is_empty() {
        // Nothing cleared the bar; fall back to raw scores so the
        // caller is never left without grounding.
        tracing::debug!(
            threshold,
            candidates = scored.len(),
            "no chunk passed the relevance threshold, falling back to raw ranking"
        );
        &scored
    } else {
        &passing
    };

    let mut selected: Vec<(usize, f32)> = Vec::with_capacity(limit);
    let mut per_document: HashMap<&str, usize> = HashMap::new();

    // First pass: at most one chunk per distinct document.
    for &(idx, score) in pool.iter() {
        if selected.len() >= limit {
            break;
        }
        let doc_id = candidates[idx].chunk.document_id.as_str();
        if !per_document.contains_key(doc_id) {
            per_document.insert(doc_id, 1);
            selected.push((idx, score));
        }
    }

    // Second pass: fill remaining slots down the score order, capped
    // per document.
    for &(idx, score) in pool.iter() {
        if selected.len() >= limit {
            break;
        }
        if selected.iter().any(|(chosen, _)| *chosen == idx) {
            continue;
        }
        let doc_id = candidates[idx].chunk.document_id.as_str();
        let count = per_document.entry(doc_id).or_insert(0);
        if *count < max_per_document {
            *count += 1;
            selected.push((idx, score));
        }
    }

    selected
        .into_iter()
        .map(|(idx, score)| {
            let candidate = &candidates[idx];
            Citation {
                document_id: candidate.chunk.document_id.clone(),
                document_name: candidate.document_name.clone(),
                text: candidate.chunk.text.clone(),
                similarity: score,
            }
        })
        .collect()
}
