use std::sync::Arc;

use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Embedder, LexicalEmbedder};

/// Vector space a batch of embeddings was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingSpace {
    Neural,
    Lexical,
}

/// Embeddings for a batch of texts, all from the same space.
#[derive(Debug, Clone)]
pub struct EmbeddedBatch {
    pub vectors: Vec<Vec<f32>>,
    pub space: EmbeddingSpace,
}

/// Embeds batches with a primary embedder, switching the whole batch to the lexical
/// space if any text fails.
///
/// Vectors from different spaces are never mixed within one batch, so similarities
/// computed over a batch are always meaningful.
#[derive(Clone)]
pub struct FallbackEmbedder {
    primary: Option<Arc<dyn Embedder>>,
    lexical: LexicalEmbedder,
}

impl FallbackEmbedder {
    pub fn new(primary: Arc<dyn Embedder>) -> Self {
        Self {
            primary: Some(primary),
            lexical: LexicalEmbedder::default(),
        }
    }

    /// Lexical space only.
    pub fn lexical_only() -> Self {
        Self {
            primary: None,
            lexical: LexicalEmbedder::default(),
        }
    }

    pub fn primary_name(&self) -> &str {
        self.primary
            .as_deref()
            .map(|p| p.name())
            .unwrap_or_else(|| self.lexical.name())
    }

    /// Embeds every text concurrently, falling back to the lexical space as a unit.
    pub async fn embed_all(&self, texts: &[String]) -> EmbeddedBatch {
        if let Some(primary) = &self.primary {
            match try_join_all(texts.iter().map(|t| primary.embed(t))).await {
                Ok(vectors) => {
                    let space = if primary.is_neural() {
                        EmbeddingSpace::Neural
                    } else {
                        EmbeddingSpace::Lexical
                    };
                    return EmbeddedBatch { vectors, space };
                }
                Err(e) => warn!(
                    embedder = primary.name(),
                    error = %e,
                    batch = texts.len(),
                    "Embedder unavailable; falling back to lexical space"
                ),
            }
        }

        EmbeddedBatch {
            vectors: texts.iter().map(|t| self.lexical.embed_sync(t)).collect(),
            space: EmbeddingSpace::Lexical,
        }
    }
}

impl std::fmt::Debug for FallbackEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackEmbedder")
            .field("primary", &self.primary_name())
            .field("lexical_dim", &self.lexical.dimension())
            .finish()
    }
}
