//! Process statistics.
//!
//! [`Stats`] is constructed by the caller and shared by `Arc`; components only
//! increment it. There is no global instance.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::model::Verdict;

macro_rules! counters {
    ($($name:ident),* $(,)?) => {
        /// Monotonic counters shared by every component.
        #[derive(Debug, Default)]
        pub struct Stats {
            $($name: AtomicU64,)*
        }

        /// Point-in-time copy of [`Stats`].
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct StatsSnapshot {
            $(pub $name: u64,)*
        }

        impl Stats {
            $(
                #[inline]
                pub fn $name(&self) -> u64 {
                    self.$name.load(Ordering::Relaxed)
                }
            )*

            /// Reads every counter.
            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $($name: self.$name.load(Ordering::Relaxed),)*
                }
            }
        }
    };
}

counters!(
    feedback_accepted,
    feedback_rejected_validation,
    feedback_rejected_qualification,
    feedback_dependency_failures,
    feedback_over_budget,
    verdict_correct,
    verdict_incomplete,
    verdict_incorrect,
    golden_lookups,
    golden_signature_hits,
    golden_semantic_hits,
    golden_populated,
    golden_auto_approved,
    golden_invalidated,
    consensus_completed,
    consensus_reached,
    consensus_expired,
    batch_runs,
    batch_failures,
    patterns_created,
    patterns_merged,
);

/// Which counter an event bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    FeedbackAccepted,
    FeedbackRejectedValidation,
    FeedbackRejectedQualification,
    FeedbackDependencyFailure,
    FeedbackOverBudget,
    GoldenLookup,
    GoldenSignatureHit,
    GoldenSemanticHit,
    GoldenPopulated,
    GoldenAutoApproved,
    GoldenInvalidated,
    ConsensusCompleted,
    ConsensusReached,
    ConsensusExpired,
    BatchRun,
    BatchFailure,
    PatternCreated,
    PatternMerged,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to `counter`.
    pub fn incr(&self, counter: Counter) {
        self.add(counter, 1);
    }

    /// Adds `n` to `counter`.
    pub fn add(&self, counter: Counter, n: u64) {
        let cell = match counter {
            Counter::FeedbackAccepted => &self.feedback_accepted,
            Counter::FeedbackRejectedValidation => &self.feedback_rejected_validation,
            Counter::FeedbackRejectedQualification => &self.feedback_rejected_qualification,
            Counter::FeedbackDependencyFailure => &self.feedback_dependency_failures,
            Counter::FeedbackOverBudget => &self.feedback_over_budget,
            Counter::GoldenLookup => &self.golden_lookups,
            Counter::GoldenSignatureHit => &self.golden_signature_hits,
            Counter::GoldenSemanticHit => &self.golden_semantic_hits,
            Counter::GoldenPopulated => &self.golden_populated,
            Counter::GoldenAutoApproved => &self.golden_auto_approved,
            Counter::GoldenInvalidated => &self.golden_invalidated,
            Counter::ConsensusCompleted => &self.consensus_completed,
            Counter::ConsensusReached => &self.consensus_reached,
            Counter::ConsensusExpired => &self.consensus_expired,
            Counter::BatchRun => &self.batch_runs,
            Counter::BatchFailure => &self.batch_failures,
            Counter::PatternCreated => &self.patterns_created,
            Counter::PatternMerged => &self.patterns_merged,
        };
        cell.fetch_add(n, Ordering::Relaxed);
    }

    /// Counts an accepted event under its verdict.
    pub fn record_verdict(&self, verdict: Verdict) {
        let cell = match verdict {
            Verdict::Correct => &self.verdict_correct,
            Verdict::Incomplete => &self.verdict_incomplete,
            Verdict::Incorrect => &self.verdict_incorrect,
        };
        cell.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of golden lookups that hit on either path.
    pub fn golden_hit_rate(&self) -> f64 {
        let lookups = self.golden_lookups() as f64;
        if lookups == 0.0 {
            0.0
        } else {
            (self.golden_signature_hits() + self.golden_semantic_hits()) as f64 / lookups
        }
    }
}
