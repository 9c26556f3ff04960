//! Hashing TF-IDF embedder.
//!
//! Terms are hashed into a fixed number of buckets and weighted by term frequency
//! times a length-based IDF approximation, then L2-normalized. Needs no service and
//! never fails, so it backs every component when the neural embedder is down.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{Embedder, EmbeddingError, l2_normalize};
use crate::constants::LEXICAL_EMBEDDING_DIM;
use crate::hashing::hash_to_u64;
use crate::text::content_terms;

/// Always-available lexical vector space.
#[derive(Debug, Clone)]
pub struct LexicalEmbedder {
    dimension: usize,
}

impl LexicalEmbedder {
    /// Creates an embedder producing `dimension`-length vectors (at least 1).
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Output dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embeds synchronously. The all-zero vector is returned for text without terms.
    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let terms = content_terms(text);
        let mut vector = vec![0.0f32; self.dimension];
        if terms.is_empty() {
            return vector;
        }

        let mut tf: HashMap<&str, f32> = HashMap::new();
        for term in &terms {
            *tf.entry(term.as_str()).or_default() += 1.0;
        }

        let total = terms.len() as f32;
        for (term, count) in tf {
            let freq = count / total;
            let idf = 1.0 + (term.chars().count() as f32).ln();
            let bucket = (hash_to_u64(term.as_bytes()) % self.dimension as u64) as usize;
            vector[bucket] += freq * idf;
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl Default for LexicalEmbedder {
    fn default() -> Self {
        Self::new(LEXICAL_EMBEDDING_DIM)
    }
}

#[async_trait]
impl Embedder for LexicalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_sync(text))
    }

    fn name(&self) -> &str {
        "lexical-tfidf"
    }

    fn is_neural(&self) -> bool {
        false
    }
}
