use std::time::Duration;

use crate::constants::{
    DEFAULT_CLUSTER_EPS, DEFAULT_CLUSTER_MIN_SAMPLES, DEFAULT_PATTERN_MERGE_THRESHOLD,
};

use super::error::BatchProcessingError;

/// Negative feedback considered on the first run, before a watermark exists.
const DEFAULT_INITIAL_LOOKBACK_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// DBSCAN neighbourhood radius, in cosine distance.
    pub eps: f32,
    /// DBSCAN minimum neighbourhood size, the point itself included.
    pub min_samples: usize,
    /// Combined name/category similarity above which patterns merge.
    pub merge_threshold: f64,
    /// How far back the first run looks.
    pub initial_lookback: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            eps: DEFAULT_CLUSTER_EPS,
            min_samples: DEFAULT_CLUSTER_MIN_SAMPLES,
            merge_threshold: DEFAULT_PATTERN_MERGE_THRESHOLD,
            initial_lookback: Duration::from_secs(DEFAULT_INITIAL_LOOKBACK_SECS),
        }
    }
}

impl ClusterConfig {
    pub fn eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    pub fn min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn merge_threshold(mut self, threshold: f64) -> Self {
        self.merge_threshold = threshold;
        self
    }

    pub fn initial_lookback(mut self, lookback: Duration) -> Self {
        self.initial_lookback = lookback;
        self
    }

    pub fn validate(&self) -> Result<(), BatchProcessingError> {
        if !(self.eps > 0.0 && self.eps <= 2.0) {
            return Err(BatchProcessingError::ConfigError {
                reason: format!("eps must be within (0, 2], got {}", self.eps),
            });
        }
        if self.min_samples < 2 {
            return Err(BatchProcessingError::ConfigError {
                reason: format!("min_samples must be at least 2, got {}", self.min_samples),
            });
        }
        if !(0.0..=1.0).contains(&self.merge_threshold) {
            return Err(BatchProcessingError::ConfigError {
                reason: format!(
                    "merge_threshold must be within [0, 1], got {}",
                    self.merge_threshold
                ),
            });
        }
        Ok(())
    }
}
