use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
/// Errors returned by the validation-session tracker.
pub enum ConsensusError {
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
