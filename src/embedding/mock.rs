use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Embedder, EmbeddingError, LexicalEmbedder};
use crate::hashing::normalize_question;

/// Test embedder: lexical vectors by default, with per-text overrides and an
/// availability switch.
#[derive(Clone, Default)]
pub struct MockEmbedder {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    lexical: LexicalEmbedder,
    overrides: RwLock<HashMap<String, Vec<f32>>>,
    unavailable: AtomicBool,
    calls: AtomicU64,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the embedding returned for `text` (matched after normalization).
    pub fn with_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.inner
            .overrides
            .write()
            .insert(normalize_question(text), vector);
        self
    }

    /// Makes subsequent calls fail (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Number of `embed` calls so far, failed ones included.
    pub fn calls(&self) -> u64 {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Unavailable {
                reason: "mock embedder switched off".to_string(),
            });
        }
        if let Some(v) = self.inner.overrides.read().get(&normalize_question(text)) {
            return Ok(v.clone());
        }
        Ok(self.inner.lexical.embed_sync(text))
    }

    fn name(&self) -> &str {
        "mock"
    }

    fn is_neural(&self) -> bool {
        true
    }
}
