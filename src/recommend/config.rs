use std::time::Duration;

use crate::clustering::BatchProcessingError;
use crate::constants::{
    DEFAULT_MAX_RECOMMENDATIONS, DEFAULT_MIN_RECOMMENDATION_CONFIDENCE,
    DEFAULT_MIN_RECOMMENDATION_IMPACT,
};

/// Unresolved consensus results older than this are not turned into actions.
const DEFAULT_CONSENSUS_LOOKBACK_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    pub max_recommendations: usize,
    pub min_confidence: f64,
    pub min_impact: f64,
    /// How far back unresolved consensus results are considered.
    pub consensus_lookback: Duration,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            min_confidence: DEFAULT_MIN_RECOMMENDATION_CONFIDENCE,
            min_impact: DEFAULT_MIN_RECOMMENDATION_IMPACT,
            consensus_lookback: Duration::from_secs(DEFAULT_CONSENSUS_LOOKBACK_SECS),
        }
    }
}

impl RecommenderConfig {
    pub fn max_recommendations(mut self, max: usize) -> Self {
        self.max_recommendations = max;
        self
    }

    pub fn min_confidence(mut self, min: f64) -> Self {
        self.min_confidence = min;
        self
    }

    pub fn min_impact(mut self, min: f64) -> Self {
        self.min_impact = min;
        self
    }

    pub fn consensus_lookback(mut self, lookback: Duration) -> Self {
        self.consensus_lookback = lookback;
        self
    }

    pub fn validate(&self) -> Result<(), BatchProcessingError> {
        if self.max_recommendations == 0 {
            return Err(BatchProcessingError::ConfigError {
                reason: "max_recommendations must be > 0".to_string(),
            });
        }
        for (name, value) in [
            ("min_confidence", self.min_confidence),
            ("min_impact", self.min_impact),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BatchProcessingError::ConfigError {
                    reason: format!("{name} must be within [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}
