use thiserror::Error;

use crate::model::ApprovalStatus;
use crate::store::StoreError;

#[derive(Debug, Error)]
/// Errors returned by golden-set cache writes. Lookups never fail.
pub enum GoldenError {
    /// The question was empty after normalization.
    #[error("question is empty")]
    EmptyQuestion,

    /// No entry exists for the signature.
    #[error("golden entry not found: {signature}")]
    NotFound { signature: String },

    /// The requested status change is not allowed.
    #[error("cannot move golden entry {signature} from {from:?} to {to:?}")]
    InvalidTransition {
        signature: String,
        from: ApprovalStatus,
        to: ApprovalStatus,
    },

    /// Optimistic retries were exhausted.
    #[error("golden entry {signature} kept changing; gave up after {attempts} attempts")]
    Contended { signature: String, attempts: usize },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience result type for golden-set operations.
pub type GoldenResult<T> = Result<T, GoldenError>;
