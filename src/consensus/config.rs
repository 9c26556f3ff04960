use std::time::Duration;

use crate::constants::{
    DEFAULT_ANSWER_SIMILARITY_THRESHOLD, DEFAULT_CONSENSUS_STRENGTH_THRESHOLD,
    DEFAULT_MIN_CONSENSUS_GROUP, DEFAULT_REQUIRED_VALIDATIONS, DEFAULT_VALIDATION_DEADLINE_SECS,
};

use super::error::ConsensusError;

#[derive(Debug, Clone)]
pub struct ConsensusConfig {
    /// Pairwise similarity that must be strictly exceeded to share a group.
    pub similarity_threshold: f64,
    /// Dominant-weight share required for consensus.
    pub strength_threshold: f64,
    /// Minimum members of the dominant group.
    pub min_group_size: usize,
    /// Treat a lone answer as consensus.
    pub single_rater_consensus: bool,
    /// Answers that resolve a validation session.
    pub required_validations: usize,
    /// Sessions older than this expire.
    pub validation_deadline: Duration,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_ANSWER_SIMILARITY_THRESHOLD,
            strength_threshold: DEFAULT_CONSENSUS_STRENGTH_THRESHOLD,
            min_group_size: DEFAULT_MIN_CONSENSUS_GROUP,
            single_rater_consensus: false,
            required_validations: DEFAULT_REQUIRED_VALIDATIONS,
            validation_deadline: Duration::from_secs(DEFAULT_VALIDATION_DEADLINE_SECS),
        }
    }
}

impl ConsensusConfig {
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn strength_threshold(mut self, threshold: f64) -> Self {
        self.strength_threshold = threshold;
        self
    }

    pub fn min_group_size(mut self, size: usize) -> Self {
        self.min_group_size = size;
        self
    }

    pub fn single_rater_consensus(mut self, enabled: bool) -> Self {
        self.single_rater_consensus = enabled;
        self
    }

    pub fn required_validations(mut self, count: usize) -> Self {
        self.required_validations = count;
        self
    }

    pub fn validation_deadline(mut self, deadline: Duration) -> Self {
        self.validation_deadline = deadline;
        self
    }

    pub fn validate(&self) -> Result<(), ConsensusError> {
        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("strength_threshold", self.strength_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConsensusError::ConfigError {
                    reason: format!("{} must be within [0, 1], got {}", name, value),
                });
            }
        }
        if self.min_group_size == 0 {
            return Err(ConsensusError::ConfigError {
                reason: "min_group_size must be > 0".to_string(),
            });
        }
        if self.required_validations == 0 {
            return Err(ConsensusError::ConfigError {
                reason: "required_validations must be > 0".to_string(),
            });
        }
        if self.validation_deadline.is_zero() {
            return Err(ConsensusError::ConfigError {
                reason: "validation_deadline must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
