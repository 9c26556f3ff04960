use std::time::Duration;

use crate::constants::{DEFAULT_MIN_TRUST_SCORE, INTAKE_SOFT_BUDGET_SECS, MAX_CORRECTION_CHARS};

use super::error::IntakeError;

#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Trust score a rater needs for feedback to be accepted.
    pub min_trust_score: f64,
    /// Longest accepted correction, in characters.
    pub max_correction_chars: usize,
    /// End-to-end time after which a submission is logged as slow.
    pub soft_budget: Duration,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            min_trust_score: DEFAULT_MIN_TRUST_SCORE,
            max_correction_chars: MAX_CORRECTION_CHARS,
            soft_budget: Duration::from_secs(INTAKE_SOFT_BUDGET_SECS),
        }
    }
}

impl IntakeConfig {
    pub fn min_trust_score(mut self, score: f64) -> Self {
        self.min_trust_score = score;
        self
    }

    pub fn max_correction_chars(mut self, chars: usize) -> Self {
        self.max_correction_chars = chars;
        self
    }

    pub fn soft_budget(mut self, budget: Duration) -> Self {
        self.soft_budget = budget;
        self
    }

    pub fn validate(&self) -> Result<(), IntakeError> {
        if !(0.0..=1.0).contains(&self.min_trust_score) {
            return Err(IntakeError::ConfigError {
                reason: format!(
                    "min_trust_score must be within [0, 1], got {}",
                    self.min_trust_score
                ),
            });
        }
        if self.max_correction_chars == 0 {
            return Err(IntakeError::ConfigError {
                reason: "max_correction_chars must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
