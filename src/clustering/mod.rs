//! Failure clustering: groups negative feedback into ranked failure patterns.
//!
//! A pass categorises each report by keywords, embeds the batch (neural space when
//! available, lexical TF-IDF otherwise), runs DBSCAN through `linfa-clustering`,
//! synthesizes a pattern per cluster and per recurring category, then merges them
//! into the stored patterns.

pub mod categorize;
pub mod config;
pub mod dbscan;
pub mod error;
pub mod job;
pub mod pattern;


pub use categorize::{Categorization, categorize};
pub use config::ClusterConfig;
pub use dbscan::{Clustering, dbscan};
pub use error::{BatchProcessingError, BatchResult};
pub use job::{ClusterReport, ClusteringJob};
pub use pattern::{FailureSample, impact_score, merge_similarity, weighted_majority};
