//! Deterministic hashed term-frequency embedder.
//!
//! Hashes terms into fixed-dimension buckets (FNV-1a), weights by term
//! frequency with a length-based IDF approximation, and L2-normalizes.
//! Needs no model files, so it is always available.

use std::collections::HashMap;

use quarry_core::errors::BackendError;
use quarry_core::text::{fnv1a, tokenize};
use quarry_core::traits::IQueryEmbedder;

pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut vec = vec![0.0f32; self.dimensions];
        if tokens.is_empty() {
            return vec;
        }

        let mut tf: HashMap<&str, f32> = HashMap::new();
        for tok in &tokens {
            *tf.entry(tok.as_str()).or_default() += 1.0;
        }

        let total = tokens.len() as f32;
        for (term, count) in tf {
            let idf = 1.0 + (term.len() as f32).ln();
            let bucket = (fnv1a(term) % self.dimensions as u64) as usize;
            vec[bucket] += (count / total) * idf;
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl IQueryEmbedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        Ok(self.vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing-tf"
    }
}
