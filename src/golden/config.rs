use crate::constants::{
    DEFAULT_AUTO_APPROVE_TRUST, DEFAULT_INVALIDATION_TRUST, DEFAULT_SEMANTIC_HIT_THRESHOLD,
    DEFAULT_SIGNATURE_CAPACITY,
};

use super::error::{GoldenError, GoldenResult};

#[derive(Debug, Clone)]
pub struct GoldenConfig {
    /// Max entries in the in-memory signature index.
    pub signature_capacity: u64,
    /// Rater trust at or above which a "correct" verdict approves immediately.
    pub auto_approve_trust: f64,
    /// Rater trust at or above which an "incorrect" verdict invalidates.
    pub invalidation_trust: f64,
    /// Cosine similarity at or above which a lookup is a semantic hit.
    pub semantic_threshold: f32,
}

impl Default for GoldenConfig {
    fn default() -> Self {
        Self {
            signature_capacity: DEFAULT_SIGNATURE_CAPACITY,
            auto_approve_trust: DEFAULT_AUTO_APPROVE_TRUST,
            invalidation_trust: DEFAULT_INVALIDATION_TRUST,
            semantic_threshold: DEFAULT_SEMANTIC_HIT_THRESHOLD,
        }
    }
}

impl GoldenConfig {
    pub fn signature_capacity(mut self, capacity: u64) -> Self {
        self.signature_capacity = capacity;
        self
    }

    pub fn auto_approve_trust(mut self, trust: f64) -> Self {
        self.auto_approve_trust = trust;
        self
    }

    pub fn invalidation_trust(mut self, trust: f64) -> Self {
        self.invalidation_trust = trust;
        self
    }

    pub fn semantic_threshold(mut self, threshold: f32) -> Self {
        self.semantic_threshold = threshold;
        self
    }

    pub fn validate(&self) -> GoldenResult<()> {
        if self.signature_capacity == 0 {
            return Err(GoldenError::ConfigError {
                reason: "signature_capacity must be > 0".to_string(),
            });
        }
        for (name, value) in [
            ("auto_approve_trust", self.auto_approve_trust),
            ("invalidation_trust", self.invalidation_trust),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(GoldenError::ConfigError {
                    reason: format!("{} must be within [0, 1], got {}", name, value),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.semantic_threshold) || self.semantic_threshold == 0.0 {
            return Err(GoldenError::ConfigError {
                reason: format!(
                    "semantic_threshold must be within (0, 1], got {}",
                    self.semantic_threshold
                ),
            });
        }
        Ok(())
    }
}
