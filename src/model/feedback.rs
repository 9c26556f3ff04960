use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FeedbackId, QueryId, RaterId};

/// A rater's judgement of an AI answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incomplete,
    Incorrect,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incomplete => "incomplete",
            Verdict::Incorrect => "incorrect",
        }
    }

    /// `true` for verdicts that feed failure clustering.
    pub fn is_negative(&self) -> bool {
        !matches!(self, Verdict::Correct)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "correct" => Ok(Verdict::Correct),
            "incomplete" => Ok(Verdict::Incomplete),
            "incorrect" => Ok(Verdict::Incorrect),
            other => Err(format!("unknown verdict: {}", other)),
        }
    }
}

/// Fixed taxonomy of failure reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Calculation,
    OutdatedReference,
    Misinterpretation,
    MissingContext,
    Hallucination,
    Incomplete,
    Formatting,
    Other,
}

impl FailureCategory {
    pub const ALL: [FailureCategory; 8] = [
        FailureCategory::Calculation,
        FailureCategory::OutdatedReference,
        FailureCategory::Misinterpretation,
        FailureCategory::MissingContext,
        FailureCategory::Hallucination,
        FailureCategory::Incomplete,
        FailureCategory::Formatting,
        FailureCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::Calculation => "calculation",
            FailureCategory::OutdatedReference => "outdated_reference",
            FailureCategory::Misinterpretation => "misinterpretation",
            FailureCategory::MissingContext => "missing_context",
            FailureCategory::Hallucination => "hallucination",
            FailureCategory::Incomplete => "incomplete",
            FailureCategory::Formatting => "formatting",
            FailureCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FailureCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        FailureCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == tag)
            .ok_or_else(|| format!("unknown failure category: {}", s.trim()))
    }
}

/// Downstream action chosen for an accepted feedback event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTaken {
    Acknowledged,
    EnhancementQueued,
    SuggestionLogged,
    CorrectionQueued,
    CriticalReviewFlagged,
}

impl ActionTaken {
    /// Maps a verdict (and whether a correction was supplied) to its action.
    pub fn for_verdict(verdict: Verdict, has_correction: bool) -> Self {
        match (verdict, has_correction) {
            (Verdict::Correct, _) => ActionTaken::Acknowledged,
            (Verdict::Incomplete, true) => ActionTaken::EnhancementQueued,
            (Verdict::Incomplete, false) => ActionTaken::SuggestionLogged,
            (Verdict::Incorrect, true) => ActionTaken::CorrectionQueued,
            (Verdict::Incorrect, false) => ActionTaken::CriticalReviewFlagged,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionTaken::Acknowledged => "acknowledged",
            ActionTaken::EnhancementQueued => "enhancement_queued",
            ActionTaken::SuggestionLogged => "suggestion_logged",
            ActionTaken::CorrectionQueued => "correction_queued",
            ActionTaken::CriticalReviewFlagged => "critical_review_flagged",
        }
    }
}

impl std::fmt::Display for ActionTaken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An AI-answered question that raters judge. Owned by the generation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: QueryId,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl QueryRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: QueryId::new(),
            question: question.into(),
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }
}

/// One accepted rating. Immutable apart from `action_taken`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub id: FeedbackId,
    pub query_id: QueryId,
    pub rater_id: RaterId,
    pub verdict: Verdict,
    pub category: Option<FailureCategory>,
    pub correction: Option<String>,
    pub confidence: f64,
    pub time_spent_seconds: f64,
    pub created_at: DateTime<Utc>,
    pub action_taken: Option<ActionTaken>,
}

impl FeedbackEvent {
    /// The correction if one was supplied and is not blank.
    pub fn correction_text(&self) -> Option<&str> {
        self.correction
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
