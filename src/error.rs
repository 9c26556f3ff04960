//! Errors shared across components.

use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;

#[derive(Debug, Error)]
/// A collaborator (embedding service or durable store) could not serve a request.
///
/// Components degrade to fallback behavior where they can and surface this error
/// only when they cannot.
pub enum DependencyUnavailableError {
    #[error("embedding collaborator unavailable: {0}")]
    Embedding(#[source] EmbeddingError),

    #[error("store collaborator unavailable: {0}")]
    Store(#[source] StoreError),
}

impl DependencyUnavailableError {
    /// `true` when the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        match self {
            DependencyUnavailableError::Embedding(e) => e.is_transient(),
            DependencyUnavailableError::Store(e) => e.is_unavailable() || e.is_conflict(),
        }
    }

    /// Short collaborator name for logs and response bodies.
    pub fn dependency(&self) -> &'static str {
        match self {
            DependencyUnavailableError::Embedding(_) => "embedding",
            DependencyUnavailableError::Store(_) => "store",
        }
    }
}

impl From<StoreError> for DependencyUnavailableError {
    fn from(err: StoreError) -> Self {
        DependencyUnavailableError::Store(err)
    }
}

impl From<EmbeddingError> for DependencyUnavailableError {
    fn from(err: EmbeddingError) -> Self {
        DependencyUnavailableError::Embedding(err)
    }
}
