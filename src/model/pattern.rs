use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FailureCategory, PatternId};

/// How a failure pattern was discovered, and what kind of failure it aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Calculation,
    OutdatedReference,
    Misinterpretation,
    /// A semantic cluster whose members span no single dominant category.
    SemanticCluster,
    /// A recurring category without a tighter semantic grouping.
    Category,
}

impl PatternType {
    /// Impact multiplier applied on top of frequency and confidence.
    pub fn impact_multiplier(&self) -> f64 {
        match self {
            PatternType::Calculation => 1.3,
            PatternType::OutdatedReference => 1.2,
            PatternType::Misinterpretation => 1.1,
            PatternType::SemanticCluster | PatternType::Category => 1.0,
        }
    }

    /// Picks the pattern type for a cluster dominated by `category`.
    pub fn for_category(category: Option<FailureCategory>) -> Self {
        match category {
            Some(FailureCategory::Calculation) => PatternType::Calculation,
            Some(FailureCategory::OutdatedReference) => PatternType::OutdatedReference,
            Some(FailureCategory::Misinterpretation) => PatternType::Misinterpretation,
            _ => PatternType::SemanticCluster,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Calculation => "calculation",
            PatternType::OutdatedReference => "outdated_reference",
            PatternType::Misinterpretation => "misinterpretation",
            PatternType::SemanticCluster => "semantic_cluster",
            PatternType::Category => "category",
        }
    }
}

/// Impact band derived from a pattern's impact score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTier {
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ImpactTier::Critical
        } else if score >= 0.6 {
            ImpactTier::High
        } else if score >= 0.4 {
            ImpactTier::Medium
        } else {
            ImpactTier::Low
        }
    }
}

/// A named, ranked aggregation of similar negative-feedback events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePattern {
    pub id: PatternId,
    pub name: String,
    pub pattern_type: PatternType,
    pub categories: Vec<FailureCategory>,
    pub frequency: u64,
    pub impact_score: f64,
    pub confidence: f64,
    pub examples: Vec<String>,
    pub keywords: Vec<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub resolved: bool,
}

impl FailurePattern {
    pub fn impact_tier(&self) -> ImpactTier {
        ImpactTier::from_score(self.impact_score)
    }
}
