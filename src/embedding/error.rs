use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by embedding collaborators.
pub enum EmbeddingError {
    /// The embedding service could not be reached or refused the request.
    #[error("embedding service unavailable: {reason}")]
    Unavailable { reason: String },

    /// The service answered, but not with a usable embedding.
    #[error("invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    /// The returned vector had an unexpected length.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid embedder configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    /// `true` when retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingError::Unavailable { .. })
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EmbeddingError::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            EmbeddingError::Unavailable {
                reason: err.to_string(),
            }
        }
    }
}
