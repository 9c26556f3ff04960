//! HTTP gateway (Axum) for feedback intake and golden-set lookup.
//!
//! This module is primarily used by the `golden` server binary.

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::{ErrorResponse, GatewayError};
pub use handler::{
    LookupRequest, RecommendationsResponse, golden_lookup_handler, recommendations_handler,
    stats_handler, submit_feedback_handler,
};
pub use state::HandlerState;

use crate::golden::{
    GOLDEN_STATUS_HEADER, GOLDEN_STATUS_HEALTHY, GOLDEN_STATUS_NOT_READY, GOLDEN_STATUS_READY,
};
use crate::store::FeedbackStore;

pub fn create_router_with_state<S: FeedbackStore>(state: HandlerState<S>) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler::<S>))
        .route("/v1/feedback", post(submit_feedback_handler::<S>))
        .route("/v1/golden/lookup", post(golden_lookup_handler::<S>))
        .route("/v1/recommendations", get(recommendations_handler::<S>))
        .route("/v1/stats", get(stats_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub golden_index: &'static str,
    pub golden_entries: usize,
    pub embedder: String,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        GOLDEN_STATUS_HEADER,
        HeaderValue::from_static(GOLDEN_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler<S: FeedbackStore>(State(state): State<HandlerState<S>>) -> Response {
    let is_ready = state.is_warmed();
    let components = ComponentStatus {
        http: GOLDEN_STATUS_READY,
        golden_index: if is_ready { GOLDEN_STATUS_READY } else { "pending" },
        golden_entries: state.golden.len(),
        embedder: state.embedder_name.clone(),
    };

    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, GOLDEN_STATUS_READY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, GOLDEN_STATUS_NOT_READY)
    };

    let mut headers = HeaderMap::new();
    headers.insert(GOLDEN_STATUS_HEADER, HeaderValue::from_static(status_msg));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}
