use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::golden::GoldenCache;
use crate::intake::FeedbackIntake;
use crate::recommend::Recommender;
use crate::stats::Stats;
use crate::store::FeedbackStore;

pub struct HandlerState<S: FeedbackStore> {
    pub intake: Arc<FeedbackIntake<S>>,

    pub golden: Arc<GoldenCache<S>>,

    pub recommender: Arc<Recommender<S>>,

    pub stats: Arc<Stats>,

    /// Name of the primary embedder, reported by `/ready`.
    pub embedder_name: String,

    /// Set once the golden indexes have been warmed from the store.
    pub warmed: Arc<AtomicBool>,
}

impl<S: FeedbackStore> Clone for HandlerState<S> {
    fn clone(&self) -> Self {
        Self {
            intake: Arc::clone(&self.intake),
            golden: Arc::clone(&self.golden),
            recommender: Arc::clone(&self.recommender),
            stats: Arc::clone(&self.stats),
            embedder_name: self.embedder_name.clone(),
            warmed: Arc::clone(&self.warmed),
        }
    }
}

impl<S: FeedbackStore> HandlerState<S> {
    pub fn new(
        intake: Arc<FeedbackIntake<S>>,
        golden: Arc<GoldenCache<S>>,
        recommender: Arc<Recommender<S>>,
        stats: Arc<Stats>,
        embedder_name: impl Into<String>,
    ) -> Self {
        Self {
            intake,
            golden,
            recommender,
            stats,
            embedder_name: embedder_name.into(),
            warmed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn mark_warmed(&self) {
        self.warmed.store(true, Ordering::Release);
    }

    pub fn is_warmed(&self) -> bool {
        self.warmed.load(Ordering::Acquire)
    }
}
