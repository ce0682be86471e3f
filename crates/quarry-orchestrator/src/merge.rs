//! Candidate merging and optional cross-backend content dedup.

use std::collections::HashMap;

use quarry_core::models::{BackendKind, Candidate, ScoredCandidate};
use quarry_core::text::normalize;

/// Concatenate backend lists, keeping the highest raw score per
/// `(backend, document_id)`. First-seen order is preserved.
pub fn merge(lists: impl IntoIterator<Item = Vec<Candidate>>) -> Vec<Candidate> {
    let mut index: HashMap<(BackendKind, String), usize> = HashMap::new();
    let mut merged: Vec<Candidate> = Vec::new();
    for candidate in lists.into_iter().flatten() {
        let key = (candidate.backend, candidate.document_id.clone());
        match index.get(&key) {
            Some(&i) => {
                if candidate.raw_score > merged[i].raw_score {
                    merged[i] = candidate;
                }
            }
            None => {
                index.insert(key, merged.len());
                merged.push(candidate);
            }
        }
    }
    merged
}

pub fn content_hash(content: &str) -> blake3::Hash {
    blake3::hash(normalize(content).as_bytes())
}

/// Keep one copy per normalized content, preferring higher similarity and
/// then earlier rank. Input and output are in rank order.
pub fn dedup_by_content(ranked: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let hashes: Vec<blake3::Hash> = ranked
        .iter()
        .map(|s| content_hash(&s.candidate.content))
        .collect();

    let mut winner: HashMap<blake3::Hash, usize> = HashMap::new();
    for (i, hash) in hashes.iter().enumerate() {
        match winner.get(hash) {
            Some(&w) if ranked[w].similarity() >= ranked[i].similarity() => {}
            _ => {
                winner.insert(*hash, i);
            }
        }
    }

    ranked
        .into_iter()
        .enumerate()
        .filter(|(i, _)| winner.get(&hashes[*i]) == Some(i))
        .map(|(_, s)| s)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::models::Factor;
    use std::collections::BTreeMap;

    fn c(backend: BackendKind, id: &str, raw: f64, content: &str) -> Candidate {
        Candidate::new(backend, id, "s", raw, content)
    }

    fn sc(backend: BackendKind, id: &str, sim: f64, content: &str) -> ScoredCandidate {
        ScoredCandidate {
            candidate: c(backend, id, sim, content),
            relevance_score: sim,
            score_breakdown: BTreeMap::from([(Factor::Similarity, sim)]),
        }
    }

    #[test]
    fn keeps_highest_score_per_backend_document() {
        let merged = merge(vec![
            vec![
                c(BackendKind::HostedIndex, "a", 0.4, "x"),
                c(BackendKind::HostedIndex, "a", 0.9, "x"),
            ],
            vec![c(BackendKind::InMemory, "a", 0.2, "x")],
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].raw_score, 0.9);
        assert_eq!(merged[1].backend, BackendKind::InMemory);
    }

    #[test]
    fn content_dedup_prefers_higher_similarity() {
        let out = dedup_by_content(vec![
            sc(BackendKind::HostedIndex, "h", 0.6, "Zero the  gauge"),
            sc(BackendKind::InMemory, "m", 0.8, "zero the gauge"),
            sc(BackendKind::InMemory, "o", 0.5, "other"),
        ]);
        let ids: Vec<_> = out.iter().map(|s| s.candidate.document_id.as_str()).collect();
        assert_eq!(ids, vec!["m", "o"]);
    }
}
