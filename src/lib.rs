//! Golden feedback library crate (used by the server and integration tests).
//!
//! # Public API Surface
//!
//! The crate turns expert ratings of AI answers into rater trust, reconciled
//! consensus, ranked failure patterns and a cache of vetted answers. The exports
//! are organized by component:
//!
//! ## Intake & Trust
//! - [`FeedbackIntake`], [`FeedbackSubmission`], [`FeedbackReceipt`] - Validated feedback ingestion
//! - [`trust_score`], [`TrustInputs`] - Rater trust scoring
//!
//! ## Consensus
//! - [`ConsensusEngine`], [`ConsensusTracker`] - Reconciliation and validation sessions
//!
//! ## Golden-Set Cache
//! - [`GoldenCache`], [`GoldenLookup`], [`MatchType`] - Vetted answers served ahead of generation
//!
//! ## Batch Jobs
//! - [`ClusteringJob`] - Failure clustering
//! - [`Recommender`] - Improvement recommendations
//! - [`BatchScheduler`] - Periodic driver for both, plus consensus expiry
//!
//! ## Collaborators
//! - [`FeedbackStore`], [`InMemoryStore`] - Durable store
//! - [`Embedder`], [`HttpEmbedder`], [`LexicalEmbedder`], [`FallbackEmbedder`] - Embeddings
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod clustering;
pub mod config;
pub mod consensus;
pub mod constants;
pub mod embedding;
pub mod error;
pub mod gateway;
pub mod golden;
pub mod hashing;
pub mod intake;
pub mod model;
pub mod recommend;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod text;
pub mod trust;

pub use clustering::{
    BatchProcessingError, BatchResult, ClusterConfig, ClusterReport, ClusteringJob,
};
pub use config::{Config, ConfigError};
pub use consensus::{
    ConsensusConfig, ConsensusEngine, ConsensusError, ConsensusTracker, RaterAnswer,
    Reconciliation,
};
pub use embedding::{
    EmbeddedBatch, Embedder, EmbeddingError, EmbeddingSpace, FallbackEmbedder, HttpEmbedder,
    LexicalEmbedder,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use error::DependencyUnavailableError;
pub use golden::{
    GOLDEN_STATUS_HEADER, GoldenCache, GoldenConfig, GoldenError, GoldenLookup, GoldenResult,
    MatchType, PopulateOutcome, PopulateRequest,
};
pub use hashing::{normalize_question, question_signature};
pub use intake::{
    FeedbackIntake, FeedbackReceipt, FeedbackSubmission, IntakeConfig, IntakeError,
    IntakeResult, RaterNotQualifiedError, ValidationError,
};
pub use recommend::{Recommender, RecommenderConfig};
pub use scheduler::{BatchReport, BatchScheduler};
pub use stats::{Stats, StatsSnapshot};
pub use store::{FeedbackStore, InMemoryStore, StoreError, StoreResult};
pub use trust::{TrustInputs, trust_score};
