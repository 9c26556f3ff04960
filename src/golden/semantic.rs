//! Embedding index over approved entries.
//!
//! A brute-force cosine scan over half-precision vectors. Golden sets are small
//! (thousands of vetted answers), so a linear scan is well inside the lookup budget.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::embedding::cosine_similarity_f16;
use crate::model::GoldenEntry;

/// Best semantic candidate for a query.
#[derive(Debug, Clone)]
pub struct SemanticMatch {
    pub entry: Arc<GoldenEntry>,
    pub score: f32,
}

#[derive(Default)]
pub struct SemanticIndex {
    entries: RwLock<Vec<Arc<GoldenEntry>>>,
}

impl SemanticIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry with the same signature.
    pub fn upsert(&self, entry: Arc<GoldenEntry>) {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.signature == entry.signature) {
            Some(slot) => *slot = entry,
            None => entries.push(entry),
        }
    }

    pub fn remove(&self, signature: &[u8; 32]) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| &e.signature != signature);
        entries.len() != before
    }

    pub fn get(&self, signature: &[u8; 32]) -> Option<Arc<GoldenEntry>> {
        self.entries
            .read()
            .iter()
            .find(|e| &e.signature == signature)
            .cloned()
    }

    /// Highest-scoring servable entry with similarity `>= threshold`.
    pub fn best_match(&self, query: &[f32], threshold: f32) -> Option<SemanticMatch> {
        let entries = self.entries.read();
        let mut best: Option<SemanticMatch> = None;
        for entry in entries.iter().filter(|e| e.is_servable()) {
            let score = cosine_similarity_f16(&entry.embedding, query);
            if score < threshold {
                continue;
            }
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(SemanticMatch {
                    entry: entry.clone(),
                    score,
                });
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("entries", &self.len())
            .finish()
    }
}
