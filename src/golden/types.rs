use serde::{Deserialize, Serialize};

pub const GOLDEN_STATUS_HEADER: &str = "X-Golden-Status";
pub const GOLDEN_STATUS_HEALTHY: &str = "healthy";
pub const GOLDEN_STATUS_READY: &str = "ready";
pub const GOLDEN_STATUS_NOT_READY: &str = "not_ready";
pub const GOLDEN_STATUS_ACCEPTED: &str = "accepted";
pub const GOLDEN_STATUS_REJECTED: &str = "rejected";
pub const GOLDEN_STATUS_ERROR: &str = "error";
pub const GOLDEN_STATUS_HIT: &str = "hit";
pub const GOLDEN_STATUS_MISS: &str = "miss";
/// Read-only operational endpoints.
pub const GOLDEN_STATUS_OK: &str = "ok";

/// Which lookup path produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Normalized-signature match.
    Signature,
    /// Embedding similarity at or above the semantic threshold.
    Semantic,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Signature => "signature",
            MatchType::Semantic => "semantic",
        }
    }
}

/// Result of a golden-set lookup. A miss is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoldenLookup {
    pub hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_type: Option<MatchType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
}

impl GoldenLookup {
    pub fn miss() -> Self {
        Self {
            hit: false,
            match_type: None,
            answer: None,
            similarity_score: None,
        }
    }

    pub fn hit(match_type: MatchType, answer: impl Into<String>, similarity: f32) -> Self {
        Self {
            hit: true,
            match_type: Some(match_type),
            answer: Some(answer.into()),
            similarity_score: Some(similarity),
        }
    }

    pub fn is_signature_hit(&self) -> bool {
        self.match_type == Some(MatchType::Signature)
    }

    pub fn is_semantic_hit(&self) -> bool {
        self.match_type == Some(MatchType::Semantic)
    }
}

/// What a population request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulateOutcome {
    /// The rater cleared the auto-approval gate; the entry is servable now.
    AutoApproved,
    /// The entry awaits corroboration and is not served.
    Pending,
    /// An approved entry already exists for the signature; nothing changed.
    AlreadyApproved,
}
