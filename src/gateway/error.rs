use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::error::DependencyUnavailableError;
use crate::golden::GOLDEN_STATUS_HEADER;
use crate::intake::{IntakeError, RaterNotQualifiedError, ValidationError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("rater not qualified: {0}")]
    NotQualified(#[from] RaterNotQualifiedError),

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(#[from] DependencyUnavailableError),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<IntakeError> for GatewayError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::Validation(e) => GatewayError::Validation(e),
            IntakeError::NotQualified(e) => GatewayError::NotQualified(e),
            IntakeError::Dependency(e) => GatewayError::DependencyUnavailable(e),
            IntakeError::ConfigError { reason } => GatewayError::InternalError(reason),
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, golden_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            GatewayError::NotQualified(_) => (StatusCode::FORBIDDEN, "not_qualified"),
            GatewayError::DependencyUnavailable(e) => {
                warn!(dependency = e.dependency(), error = %e, "Dependency unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "dependency_unavailable")
            }
            GatewayError::InternalError(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(GOLDEN_STATUS_HEADER, HeaderValue::from_static(golden_status));
        if let GatewayError::DependencyUnavailable(e) = &self
            && e.is_retryable()
        {
            headers.insert("Retry-After", HeaderValue::from_static("1"));
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
