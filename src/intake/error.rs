use thiserror::Error;

use crate::error::DependencyUnavailableError;
use crate::model::RaterId;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Error)]
/// A submission was malformed. Names the first offending field.
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::InvalidField { field, .. } => field,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
/// The rater failed the trust gate. The submission is refused, not crashed on.
pub enum RaterNotQualifiedError {
    #[error("rater {rater_id} is not registered")]
    UnknownRater { rater_id: RaterId },

    #[error("rater {rater_id} is deactivated")]
    Inactive { rater_id: RaterId },

    #[error("rater {rater_id} is not verified")]
    Unverified { rater_id: RaterId },

    #[error("rater {rater_id} trust score {score:.3} is below the minimum {minimum:.3}")]
    TrustBelowMinimum {
        rater_id: RaterId,
        score: f64,
        minimum: f64,
    },
}

#[derive(Debug, Error)]
/// Errors returned by [`FeedbackIntake::submit`](super::FeedbackIntake::submit).
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotQualified(#[from] RaterNotQualifiedError),

    #[error(transparent)]
    Dependency(#[from] DependencyUnavailableError),

    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

impl From<StoreError> for IntakeError {
    fn from(err: StoreError) -> Self {
        IntakeError::Dependency(DependencyUnavailableError::Store(err))
    }
}

/// Convenience result type for intake operations.
pub type IntakeResult<T> = Result<T, IntakeError>;
