//! Cheap lexical stand-in for a cross-encoder.
//!
//! Scores by character-trigram containment: the share of the query's
//! trigrams that also occur in the passage. Catches inflections and
//! compound words the whole-term keyword factor misses.

use std::collections::HashSet;

use quarry_core::text::normalize;
use quarry_core::traits::ISemanticMatcher;

#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSemanticMatcher;

fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let chars: Vec<char> = normalize(text).chars().collect();
    chars.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

impl ISemanticMatcher for LexicalSemanticMatcher {
    fn score(&self, query: &str, content: &str) -> f64 {
        let q = trigrams(query);
        if q.is_empty() {
            return 0.0;
        }
        let c = trigrams(content);
        q.iter().filter(|t| c.contains(*t)).count() as f64 / q.len() as f64
    }

    fn name(&self) -> &str {
        "lexical-trigram"
    }
}
