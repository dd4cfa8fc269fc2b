//! Stage 2 — chunk dedup + multi-chunk boost (spec.md §4.4): group raw hits
//! by `parentDocId`, keep the highest-scoring chunk per parent, and boost
//! parents with more than one surviving chunk. Standalone items (no parent)
//! pass through untouched with a boost factor of 1.

use knowledge_store::SearchHit;
use std::collections::HashMap;

/// A deduplicated candidate: the winning hit from its group, plus how many
/// chunks that group had (used only to report `total_chunks` upstream; the
/// boost itself is already folded into `hit.score`).
pub struct DedupedHit {
    pub hit: SearchHit,
    pub chunk_count: usize,
}

/// `1 + min(log(chunkCount) * 0.05, 0.15)`, spec.md §4.4 stage 2.
fn multi_chunk_boost(chunk_count: usize) -> f64 {
    if chunk_count <= 1 {
        return 1.0;
    }
    1.0 + (chunk_count as f64).ln() * 0.05
}

fn clamp_boost(raw: f64) -> f64 {
    raw.min(1.15)
}

/// Groups `hits` by logical id, keeps the best-scoring hit per group, and
/// applies the boost. Order of the returned vec is unspecified — callers
/// sort by score afterward.
pub fn dedupe_and_boost(hits: Vec<SearchHit>) -> Vec<DedupedHit> {
    let mut groups: HashMap<String, Vec<SearchHit>> = HashMap::new();
    for hit in hits {
        let key = hit.item.logical_id().to_string();
        groups.entry(key).or_default().push(hit);
    }

    let mut out = Vec::with_capacity(groups.len());
    for (_, mut group) in groups {
        group.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        let chunk_count = group.len();
        let mut winner = group.remove(0);
        let boost = clamp_boost(multi_chunk_boost(chunk_count));
        winner.score *= boost;
        out.push(DedupedHit { hit: winner, chunk_count });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_model::{DataSource, EnrichedItem};

    fn chunk_hit(parent: &str, idx: usize, score: f64) -> SearchHit {
        let mut item = EnrichedItem::new(format!("{parent}_chunk_{idx}"), DataSource::Wiki, "c", "c", "h");
        item.parent_doc_id = Some(parent.to_string());
        item.chunk_index = Some(idx);
        SearchHit { item, score }
    }

    fn standalone_hit(id: &str, score: f64) -> SearchHit {
        let item = EnrichedItem::new(id, DataSource::Wiki, "c", "c", "h");
        SearchHit { item, score }
    }

    #[test]
    fn keeps_highest_scoring_chunk_per_parent() {
        let hits = vec![chunk_hit("P", 0, 0.3), chunk_hit("P", 1, 0.8), chunk_hit("P", 2, 0.5)];
        let out = dedupe_and_boost(hits);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].hit.item.id, "P_chunk_1");
        assert_eq!(out[0].chunk_count, 3);
    }

    #[test]
    fn scenario_4_three_chunk_boost_matches_formula() {
        let hits = vec![chunk_hit("X", 0, 0.80), chunk_hit("X", 1, 0.10), chunk_hit("X", 2, 0.20)];
        let out = dedupe_and_boost(hits);
        let expected = 0.80 * (1.0 + (3.0_f64).ln() * 0.05);
        assert!((out[0].hit.score - expected).abs() < 1e-9);
    }

    #[test]
    fn standalone_items_pass_through_unboosted() {
        let out = dedupe_and_boost(vec![standalone_hit("Y", 0.90)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].hit.score, 0.90);
        assert_eq!(out[0].chunk_count, 1);
    }

    #[test]
    fn boost_never_exceeds_cap_of_point_one_five() {
        let many: Vec<SearchHit> = (0..500).map(|i| chunk_hit("HUGE", i, 0.1)).collect();
        let out = dedupe_and_boost(many);
        assert!(out[0].hit.score <= 0.1 * 1.15 + 1e-9);
    }
}
