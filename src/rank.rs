//! Final-score combination and result selection.

use std::collections::HashMap;

use crate::models::ScoredDocument;
use crate::retrieval::diversity_cap;

const WEIGHT_RELEVANCE: f32 = 0.4;
const WEIGHT_BIAS_MATCH: f32 = 0.4;
const WEIGHT_IDEOLOGY: f32 = 0.2;

/// Weighted blend of the three component scores, clamped to [0, 1].
pub fn combined_score(relevance: f32, bias_match: f32, ideology: f32) -> f32 {
    let combined =
        WEIGHT_RELEVANCE * relevance + WEIGHT_BIAS_MATCH * bias_match + WEIGHT_IDEOLOGY * ideology;
    combined.clamp(0.0, 1.0)
}

/// Sort by final score descending (stable, so ties keep discovery order),
/// re-apply the per-source diversity cap, and truncate to `limit`.
pub fn select_top(mut scored: Vec<ScoredDocument>, limit: usize) -> Vec<ScoredDocument> {
    scored.sort_by(|a, b| {
        b.score
            .final_score
            .partial_cmp(&a.score.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let cap = diversity_cap(limit);
    let mut per_source: HashMap<String, usize> = HashMap::new();
    let mut selected = Vec::with_capacity(limit);

    for item in scored {
        if selected.len() >= limit {
            break;
        }
        let count = per_source
            .entry(item.document.source_domain.clone())
            .or_insert(0);
        if *count >= cap {
            continue;
        }
        *count += 1;
        selected.push(item);
    }

    selected
}
