use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use crate::model::{ActionTaken, FailureCategory, FeedbackId, QueryId, RaterId, Verdict};

/// A feedback candidate as received from a caller. Every field is optional so that
/// missing fields are reported by name rather than as a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackSubmission {
    pub query_id: Option<String>,
    pub rater_id: Option<String>,
    pub verdict: Option<String>,
    pub category: Option<String>,
    pub correction: Option<String>,
    pub confidence: Option<f64>,
    pub time_spent_seconds: Option<f64>,
}

/// A submission that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFeedback {
    pub query_id: QueryId,
    pub rater_id: RaterId,
    pub verdict: Verdict,
    pub category: Option<FailureCategory>,
    pub correction: Option<String>,
    pub confidence: f64,
    pub time_spent_seconds: f64,
}

/// What intake returns for an accepted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReceipt {
    pub feedback_id: FeedbackId,
    pub action_taken: ActionTaken,
    pub rater_trust_score: f64,
    pub processing_time_ms: u64,
}

impl FeedbackSubmission {
    /// Checks fields in a fixed order and stops at the first problem.
    pub fn validate(
        &self,
        max_correction_chars: usize,
    ) -> Result<ValidatedFeedback, ValidationError> {
        let query_id = required(&self.query_id, "query_id")?;
        let query_id = QueryId::parse(query_id).map_err(|e| ValidationError::InvalidField {
            field: "query_id",
            reason: e.to_string(),
        })?;

        let rater_id = required(&self.rater_id, "rater_id")?;
        let rater_id = RaterId::parse(rater_id).map_err(|e| ValidationError::InvalidField {
            field: "rater_id",
            reason: e.to_string(),
        })?;

        let verdict = required(&self.verdict, "verdict")?;
        let verdict: Verdict = verdict
            .parse()
            .map_err(|reason| ValidationError::InvalidField {
                field: "verdict",
                reason,
            })?;

        let category = match self.category.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(tag) => Some(tag.parse::<FailureCategory>().map_err(|reason| {
                ValidationError::InvalidField {
                    field: "category",
                    reason,
                }
            })?),
        };

        let confidence = self.confidence.ok_or(ValidationError::MissingField {
            field: "confidence",
        })?;
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::InvalidField {
                field: "confidence",
                reason: format!("must be within [0, 1], got {}", confidence),
            });
        }

        let time_spent_seconds = self.time_spent_seconds.ok_or(ValidationError::MissingField {
            field: "time_spent_seconds",
        })?;
        if !time_spent_seconds.is_finite() || time_spent_seconds <= 0.0 {
            return Err(ValidationError::InvalidField {
                field: "time_spent_seconds",
                reason: format!("must be > 0, got {}", time_spent_seconds),
            });
        }

        let correction = self
            .correction
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        if let Some(text) = correction {
            let chars = text.chars().count();
            if chars > max_correction_chars {
                return Err(ValidationError::InvalidField {
                    field: "correction",
                    reason: format!(
                        "{} characters exceeds the limit of {}",
                        chars, max_correction_chars
                    ),
                });
            }
        }

        Ok(ValidatedFeedback {
            query_id,
            rater_id,
            verdict,
            category,
            correction: correction.map(str::to_string),
            confidence,
            time_spent_seconds,
        })
    }
}

fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField { field })
}
