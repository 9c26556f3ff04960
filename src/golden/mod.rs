//! Golden-set cache: vetted question → answer pairs served ahead of generation.
//!
//! Lookup order is signature index, then semantic index. Only approved entries are
//! ever served; pending and rejected ones stay in the store for audit.

pub mod cache;
pub mod config;
pub mod error;
pub mod semantic;
pub mod signature;
pub mod types;

#[cfg(test)]
mod tests;

pub use cache::{GoldenCache, PopulateRequest};
pub use config::GoldenConfig;
pub use error::{GoldenError, GoldenResult};
pub use semantic::{SemanticIndex, SemanticMatch};
pub use signature::SignatureIndex;
pub use types::{
    GOLDEN_STATUS_ACCEPTED, GOLDEN_STATUS_ERROR, GOLDEN_STATUS_HEADER, GOLDEN_STATUS_HEALTHY,
    GOLDEN_STATUS_HIT, GOLDEN_STATUS_MISS, GOLDEN_STATUS_NOT_READY, GOLDEN_STATUS_OK,
    GOLDEN_STATUS_READY, GOLDEN_STATUS_REJECTED, GoldenLookup, MatchType, PopulateOutcome,
};
