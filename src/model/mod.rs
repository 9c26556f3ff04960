//! Domain records shared by intake, consensus, clustering and the golden cache.
//!
//! Records reference each other by id only (a feedback event holds a [`RaterId`],
//! never a rater), so every record can live in its own keyed arena in the store.

mod consensus;
mod feedback;
mod golden;
mod pattern;
mod rater;
mod recommendation;

pub use consensus::{ConsensusResult, ConsensusStatus, Contributor, DisagreementArea};
pub use feedback::{ActionTaken, FailureCategory, FeedbackEvent, QueryRecord, Verdict};
pub use golden::{ApprovalStatus, GoldenEntry, Provenance, RejectedRevision};
pub use pattern::{FailurePattern, ImpactTier, PatternType};
pub use rater::RaterProfile;
pub use recommendation::{
    ActionType, EffortEstimate, ImprovementRecommendation, RecommendationSource, StatedPriority,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses an id from its hyphenated string form.
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifies a [`RaterProfile`].
    RaterId
);
id_type!(
    /// Identifies a [`FeedbackEvent`].
    FeedbackId
);
id_type!(
    /// Identifies the AI-answered query a feedback event rates.
    QueryId
);
id_type!(
    /// Identifies a [`FailurePattern`].
    PatternId
);
id_type!(
    /// Identifies a [`ConsensusResult`].
    ConsensusId
);

/// Truncates `text` to at most `max_chars` characters on a char boundary.
pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
