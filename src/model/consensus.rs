use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConsensusId, QueryId, RaterId};

/// Terminal state of a validation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStatus {
    /// The required number of validations arrived.
    Completed,
    /// The validation deadline passed first.
    Expired,
}

/// Why a set of answers failed to agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisagreementArea {
    /// Some answers affirm while others negate.
    ConflictingAssessment,
    /// Answers cite different numbers.
    NumericDivergence,
}

impl DisagreementArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisagreementArea::ConflictingAssessment => "conflicting_assessment",
            DisagreementArea::NumericDivergence => "numeric_divergence",
        }
    }
}

/// A rater's contribution to a consensus, with the weight it carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub rater_id: RaterId,
    pub weight: f64,
}

/// Reconciled outcome of several independent ratings of one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub id: ConsensusId,
    pub query_id: QueryId,
    pub contributors: Vec<Contributor>,
    pub dominant_group_size: usize,
    pub consensus_reached: bool,
    /// Dominant group weight / total weight.
    pub consensus_strength: f64,
    /// Mean pairwise similarity across all answers.
    pub agreement_score: f64,
    pub final_answer: Option<String>,
    pub disagreement_areas: Vec<DisagreementArea>,
    pub status: ConsensusStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConsensusResult {
    /// `true` when the outcome left a labelled disagreement that needs human attention.
    pub fn is_unresolved(&self) -> bool {
        !self.consensus_reached && self.error.is_none() && !self.disagreement_areas.is_empty()
    }
}
