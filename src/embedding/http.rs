//! Client for a remote embedding service.
//!
//! Protocol: `POST {base_url}/embed` with `{"text": "..."}`, answered by
//! `{"embedding": [f32, ...]}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Embedder, EmbeddingError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_RETRIES: usize = 2;
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Neural embedder reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    http: HttpClient,
    endpoint: String,
    dimension: Option<usize>,
}

impl HttpEmbedder {
    /// Creates a client for the service at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, EmbeddingError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedder url is empty".to_string(),
            });
        }

        let http = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint: format!("{}/embed", base),
            dimension: None,
        })
    }

    /// Rejects responses whose length is not `dimension`.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Full URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_once(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&EmbedRequest { text })
            .send()
            .await?;

        let status = resp.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EmbeddingError::Unavailable {
                reason: format!("embedding service returned {}", status),
            });
        }
        if !status.is_success() {
            return Err(EmbeddingError::InvalidResponse {
                reason: format!("embedding service returned {}", status),
            });
        }

        let body: EmbedResponse = resp.json().await?;
        if body.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse {
                reason: "empty embedding".to_string(),
            });
        }
        if let Some(expected) = self.dimension
            && body.embedding.len() != expected
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: body.embedding.len(),
            });
        }
        Ok(body.embedding)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self.request_once(text).await {
                Ok(embedding) => {
                    debug!(dim = embedding.len(), attempt, "Embedding received");
                    return Ok(embedding);
                }
                Err(e) if e.is_transient() && attempt <= REQUEST_RETRIES => {
                    warn!(error = %e, attempt, "Embedding request failed; retrying");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        "http"
    }

    fn is_neural(&self) -> bool {
        true
    }
}
