//! Periodic batch runs: failure clustering, recommendations and consensus expiry.

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info, warn};

use crate::clustering::{BatchProcessingError, BatchResult, ClusterReport, ClusteringJob};
use crate::consensus::ConsensusTracker;
use crate::recommend::Recommender;
use crate::stats::{Counter, Stats};
use crate::store::FeedbackStore;

/// Outcome of one scheduled tick. Each step runs even when an earlier one failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub clustering: Option<ClusterReport>,
    pub recommendations: usize,
    pub expired_sessions: usize,
    pub failures: usize,
}

/// Drives the background jobs on a fixed interval.
pub struct BatchScheduler<S: FeedbackStore> {
    interval: Duration,
    clustering: Arc<ClusteringJob<S>>,
    recommender: Arc<Recommender<S>>,
    tracker: Arc<ConsensusTracker<S>>,
    stats: Arc<Stats>,
    running: Arc<AtomicBool>,
    shutdown_initiated: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl<S: FeedbackStore> std::fmt::Debug for BatchScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchScheduler")
            .field("interval", &self.interval)
            .field("running", &self.running.load(Ordering::Relaxed))
            .field("shutdown", &self.shutdown_initiated.load(Ordering::Relaxed))
            .finish()
    }
}

impl<S: FeedbackStore> BatchScheduler<S> {
    pub fn new(
        interval: Duration,
        clustering: Arc<ClusteringJob<S>>,
        recommender: Arc<Recommender<S>>,
        tracker: Arc<ConsensusTracker<S>>,
        stats: Arc<Stats>,
    ) -> BatchResult<Self> {
        if interval.is_zero() {
            return Err(BatchProcessingError::ConfigError {
                reason: "batch interval must be > 0".to_string(),
            });
        }
        Ok(Self {
            interval,
            clustering,
            recommender,
            tracker,
            stats,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.shutdown_initiated.load(Ordering::Acquire)
    }

    /// Runs every step once. Failures are logged and counted, never returned.
    pub async fn run_once(&self) -> BatchReport {
        self.stats.incr(Counter::BatchRun);
        let mut report = BatchReport::default();

        match self.clustering.try_run().await {
            Ok(cluster) => report.clustering = Some(cluster),
            Err(BatchProcessingError::AlreadyRunning) => {
                debug!("Clustering pass still in progress, skipping this tick");
            }
            Err(e) => {
                warn!(error = %e, "Clustering pass failed, retrying next tick");
                report.failures += 1;
            }
        }

        match self.recommender.refresh().await {
            Ok(recs) => report.recommendations = recs.len(),
            Err(e) => {
                warn!(error = %e, "Recommendation refresh failed, retrying next tick");
                report.failures += 1;
            }
        }

        match self.tracker.sweep_expired(Utc::now()).await {
            Ok(expired) => report.expired_sessions = expired.len(),
            Err(e) => {
                warn!(error = %e, "Consensus expiry sweep failed, retrying next tick");
                report.failures += 1;
            }
        }

        self.stats.add(Counter::BatchFailure, report.failures as u64);
        info!(
            recommendations = report.recommendations,
            expired = report.expired_sessions,
            failures = report.failures,
            "Batch run finished"
        );
        report
    }

    /// Starts the periodic loop (no-op if already running). The first run happens
    /// immediately.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return tokio::spawn(async {});
        }

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = time::interval(scheduler.interval);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = scheduler.wake.notified() => {}
                }
                if scheduler.is_shutdown_initiated() {
                    break;
                }
                scheduler.run_once().await;
            }
            debug!("Batch scheduler stopped");
            scheduler.running.store(false, Ordering::Release);
        })
    }

    /// Stops the loop after the current run (idempotent).
    pub fn shutdown(&self) {
        if self.shutdown_initiated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.wake.notify_one();
    }
}
