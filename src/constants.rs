//! Cross-cutting, shared constants.
//!
//! Component configs default to these values. Thresholds that happen to share a
//! numeric value (the auto-approval trust and the semantic-hit similarity) are kept
//! as separate constants so they can be tuned independently.

/// Lowest trust score a rater can hold.
pub const TRUST_SCORE_FLOOR: f64 = 0.1;
/// Highest trust score a rater can hold.
pub const TRUST_SCORE_CEILING: f64 = 1.0;

/// Minimum trust score for a rater's feedback to be accepted.
pub const DEFAULT_MIN_TRUST_SCORE: f64 = 0.7;

/// Trust at or above which a "correct" verdict approves a golden entry immediately.
pub const DEFAULT_AUTO_APPROVE_TRUST: f64 = 0.95;

/// Trust at or above which an "incorrect" verdict invalidates a golden entry.
pub const DEFAULT_INVALIDATION_TRUST: f64 = 0.9;

/// Cosine similarity at or above which a golden lookup counts as a semantic hit.
pub const DEFAULT_SEMANTIC_HIT_THRESHOLD: f32 = 0.95;

/// Pairwise similarity that must be exceeded for two answers to share a group.
pub const DEFAULT_ANSWER_SIMILARITY_THRESHOLD: f64 = 0.6;

/// Dominant-weight share required for consensus.
pub const DEFAULT_CONSENSUS_STRENGTH_THRESHOLD: f64 = 0.8;

/// Minimum members in the dominant group for consensus.
pub const DEFAULT_MIN_CONSENSUS_GROUP: usize = 2;

/// Answers required before a validation session resolves.
pub const DEFAULT_REQUIRED_VALIDATIONS: usize = 2;

/// Validation sessions expire after this many seconds (48h).
pub const DEFAULT_VALIDATION_DEADLINE_SECS: u64 = 48 * 60 * 60;

/// DBSCAN neighbourhood radius in cosine-distance units.
pub const DEFAULT_CLUSTER_EPS: f32 = 0.25;

/// DBSCAN minimum neighbourhood size (the point itself included).
pub const DEFAULT_CLUSTER_MIN_SAMPLES: usize = 3;

/// Name+category similarity above which a new pattern merges into an existing one.
pub const DEFAULT_PATTERN_MERGE_THRESHOLD: f64 = 0.8;

/// Example snippets retained per failure pattern.
pub const MAX_PATTERN_EXAMPLES: usize = 5;

/// Characters kept per example snippet.
pub const MAX_SNIPPET_CHARS: usize = 160;

/// Recommendations kept per batch run.
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 10;

/// Recommendations below this confidence are dropped.
pub const DEFAULT_MIN_RECOMMENDATION_CONFIDENCE: f64 = 0.6;

/// Recommendations below this expected impact are dropped.
pub const DEFAULT_MIN_RECOMMENDATION_IMPACT: f64 = 0.2;

/// Soft end-to-end budget for a single intake call.
pub const INTAKE_SOFT_BUDGET_SECS: u64 = 30;

/// Dimension of the lexical (hashing TF-IDF) embedding space.
pub const LEXICAL_EMBEDDING_DIM: usize = 384;

/// Max entries in the in-memory signature index.
pub const DEFAULT_SIGNATURE_CAPACITY: u64 = 10_000;

/// Default interval between batch runs (clustering + recommendations + expiry sweep).
pub const DEFAULT_BATCH_INTERVAL_SECS: u64 = 60 * 60;

/// Max characters accepted in a free-text correction.
pub const MAX_CORRECTION_CHARS: usize = 10_000;

/// Optimistic compare-and-swap attempts before an update gives up.
pub const MAX_CAS_ATTEMPTS: usize = 16;
