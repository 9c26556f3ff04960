use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::golden::{
    GOLDEN_STATUS_ACCEPTED, GOLDEN_STATUS_HEADER, GOLDEN_STATUS_HIT, GOLDEN_STATUS_MISS,
    GOLDEN_STATUS_OK,
};
use crate::intake::FeedbackSubmission;
use crate::model::ImprovementRecommendation;
use crate::store::FeedbackStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<ImprovementRecommendation>,
}

fn with_status(status: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(GOLDEN_STATUS_HEADER, HeaderValue::from_static(status));
    headers
}

/// `POST /v1/feedback`
#[instrument(skip(state, request))]
pub async fn submit_feedback_handler<S: FeedbackStore>(
    State(state): State<HandlerState<S>>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let submission: FeedbackSubmission = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    let receipt = state.intake.submit(submission).await?;
    debug!(
        feedback_id = %receipt.feedback_id,
        action = receipt.action_taken.as_str(),
        "Feedback accepted"
    );

    Ok((StatusCode::OK, with_status(GOLDEN_STATUS_ACCEPTED), Json(receipt)).into_response())
}

/// `POST /v1/golden/lookup`. A miss is a 200 with `hit: false`.
#[instrument(skip(state, request))]
pub async fn golden_lookup_handler<S: FeedbackStore>(
    State(state): State<HandlerState<S>>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: LookupRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    let result = state.golden.lookup(&request.question).await;
    let status = if result.hit {
        GOLDEN_STATUS_HIT
    } else {
        GOLDEN_STATUS_MISS
    };
    Ok((StatusCode::OK, with_status(status), Json(result)).into_response())
}

/// `GET /v1/recommendations`: the latest batch's action list.
#[instrument(skip(state))]
pub async fn recommendations_handler<S: FeedbackStore>(
    State(state): State<HandlerState<S>>,
) -> Response {
    let recommendations = state.recommender.latest().as_ref().clone();
    (
        StatusCode::OK,
        with_status(GOLDEN_STATUS_OK),
        Json(RecommendationsResponse { recommendations }),
    )
        .into_response()
}

/// `GET /v1/stats`
#[instrument(skip(state))]
pub async fn stats_handler<S: FeedbackStore>(State(state): State<HandlerState<S>>) -> Response {
    (
        StatusCode::OK,
        with_status(GOLDEN_STATUS_OK),
        Json(state.stats.snapshot()),
    )
        .into_response()
}
