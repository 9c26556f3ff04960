use serde::{Deserialize, Serialize};

use super::{ConsensusId, PatternId};

/// Canonical improvement actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    UpdateReferences,
    FixFormulas,
    BroadenCoverage,
    ClarifyPrompts,
    ReviewCategory,
    ResolveDisagreement,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::UpdateReferences => "update references",
            ActionType::FixFormulas => "fix formulas",
            ActionType::BroadenCoverage => "broaden coverage",
            ActionType::ClarifyPrompts => "clarify prompts",
            ActionType::ReviewCategory => "review category",
            ActionType::ResolveDisagreement => "resolve disagreement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortEstimate {
    Low,
    Medium,
    High,
}

impl EffortEstimate {
    pub fn penalty(&self) -> f64 {
        match self {
            EffortEstimate::Low => 0.0,
            EffortEstimate::Medium => 0.1,
            EffortEstimate::High => 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatedPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl StatedPriority {
    pub fn boost(&self) -> f64 {
        match self {
            StatedPriority::Critical => 0.3,
            StatedPriority::High => 0.2,
            StatedPriority::Medium => 0.1,
            StatedPriority::Low => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum RecommendationSource {
    Pattern(PatternId),
    Consensus(ConsensusId),
}

/// One prioritized improvement action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementRecommendation {
    pub action_type: ActionType,
    pub priority_score: f64,
    pub expected_impact: f64,
    pub confidence: f64,
    pub source: RecommendationSource,
    pub effort: EffortEstimate,
    pub stated_priority: StatedPriority,
    pub description: String,
}
