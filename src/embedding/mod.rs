//! Embedding collaborator.
//!
//! - [`Embedder`] is the object-safe seam every component embeds through.
//! - [`LexicalEmbedder`] is the always-available hashing TF-IDF space.
//! - [`HttpEmbedder`] calls a remote neural embedding service.
//! - [`FallbackEmbedder`] embeds whole batches, degrading to the lexical space.

mod error;
mod fallback;
mod http;
mod lexical;
#[cfg(any(test, feature = "mock"))]
mod mock;


pub use error::EmbeddingError;
pub use fallback::{EmbeddedBatch, EmbeddingSpace, FallbackEmbedder};
pub use http::HttpEmbedder;
pub use lexical::LexicalEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;

use async_trait::async_trait;
use half::f16;

#[async_trait]
/// Produces fixed-length vectors for text.
pub trait Embedder: Send + Sync {
    /// Embeds `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    /// Short name used in logs.
    fn name(&self) -> &str;
    /// `true` for a learned (semantic) vector space.
    fn is_neural(&self) -> bool;
}

/// Cosine similarity of two equal-length vectors. Mismatched, empty or zero
/// vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Cosine similarity of a stored half-precision vector and an f32 query.
pub fn cosine_similarity_f16(stored: &[f16], query: &[f32]) -> f32 {
    if stored.len() != query.len() || stored.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_s, mut norm_q) = (0.0f32, 0.0f32, 0.0f32);
    for (s, q) in stored.iter().zip(query) {
        let s = s.to_f32();
        dot += s * q;
        norm_s += s * s;
        norm_q += q * q;
    }

    if norm_s == 0.0 || norm_q == 0.0 {
        0.0
    } else {
        (dot / (norm_s.sqrt() * norm_q.sqrt())).clamp(-1.0, 1.0)
    }
}

/// Converts an f32 embedding to half precision for storage.
pub fn to_f16(embedding: &[f32]) -> Vec<f16> {
    embedding.iter().copied().map(f16::from_f32).collect()
}

pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}
