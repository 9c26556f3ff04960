use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
/// Failures of a batch run. Logged and retried on the next scheduled run; never
/// returned to a live request.
pub enum BatchProcessingError {
    /// Another run holds the run window.
    #[error("a clustering run is already in progress")]
    AlreadyRunning,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The density clusterer refused the batch.
    #[error("clustering failed: {reason}")]
    Clustering { reason: String },

    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience result type for batch jobs.
pub type BatchResult<T> = Result<T, BatchProcessingError>;
