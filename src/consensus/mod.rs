//! Consensus engine and validation-session tracker.
//!
//! [`ConsensusEngine`] reconciles a set of trust-weighted answers into a
//! [`ConsensusResult`](crate::model::ConsensusResult). [`ConsensusTracker`] gathers
//! those answers per query as feedback arrives and feeds reached outcomes back into
//! rater accuracy and the golden set.

pub mod config;
pub mod engine;
pub mod error;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use config::ConsensusConfig;
pub use engine::{ConsensusEngine, RaterAnswer, Reconciliation};
pub use error::ConsensusError;
pub use tracker::ConsensusTracker;
