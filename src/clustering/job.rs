use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::categorize::categorize;
use super::config::ClusterConfig;
use super::dbscan::dbscan;
use super::error::{BatchProcessingError, BatchResult};
use super::pattern::{FailureSample, from_category, from_cluster, merge_into, merge_similarity};
use crate::embedding::{EmbeddingSpace, FallbackEmbedder};
use crate::model::{FailureCategory, FailurePattern};
use crate::stats::{Counter, Stats};
use crate::store::FeedbackStore;

/// Summary of one clustering pass.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterReport {
    pub events_seen: usize,
    pub events_skipped: usize,
    pub clusters: usize,
    pub noise: usize,
    pub patterns_created: usize,
    pub patterns_merged: usize,
    pub embedding_space: EmbeddingSpace,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Periodic failure clustering over negative feedback.
///
/// Each run processes events created in `[window_start, run_start)`, and the next
/// window starts where this one ended (the first run looks back
/// `initial_lookback`). Runs are serialized by an async mutex held for the whole
/// run window.
pub struct ClusteringJob<S: FeedbackStore> {
    config: ClusterConfig,
    store: Arc<S>,
    embedder: FallbackEmbedder,
    stats: Arc<Stats>,
    run_lock: tokio::sync::Mutex<()>,
    watermark: Mutex<Option<DateTime<Utc>>>,
}

impl<S: FeedbackStore> std::fmt::Debug for ClusteringJob<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusteringJob")
            .field("config", &self.config)
            .field("embedder", &self.embedder)
            .field("watermark", &*self.watermark.lock())
            .finish()
    }
}

impl<S: FeedbackStore> ClusteringJob<S> {
    pub fn new(
        config: ClusterConfig,
        store: Arc<S>,
        embedder: FallbackEmbedder,
        stats: Arc<Stats>,
    ) -> BatchResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            embedder,
            stats,
            run_lock: tokio::sync::Mutex::new(()),
            watermark: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Start of the window the next run will process.
    pub fn next_window_start(&self) -> DateTime<Utc> {
        let watermark = *self.watermark.lock();
        watermark.unwrap_or_else(|| {
            let lookback = TimeDelta::from_std(self.config.initial_lookback)
                .unwrap_or(TimeDelta::days(7));
            Utc::now() - lookback
        })
    }

    /// Runs a pass, waiting for any pass already in progress.
    pub async fn run(&self) -> BatchResult<ClusterReport> {
        let _guard = self.run_lock.lock().await;
        self.run_locked().await
    }

    /// Runs a pass unless one is already in progress.
    pub async fn try_run(&self) -> BatchResult<ClusterReport> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| BatchProcessingError::AlreadyRunning)?;
        self.run_locked().await
    }

    async fn run_locked(&self) -> BatchResult<ClusterReport> {
        let window_start = self.next_window_start();
        let window_end = Utc::now();
        let report = self.process_window(window_start, window_end).await?;
        *self.watermark.lock() = Some(window_end);
        Ok(report)
    }

    #[instrument(skip(self), fields(window_start = %window_start, window_end = %window_end))]
    async fn process_window(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> BatchResult<ClusterReport> {
        let events: Vec<_> = self
            .store
            .feedback_in_range(window_start, window_end)
            .await?
            .into_iter()
            .filter(|e| e.verdict.is_negative())
            .collect();
        let events_seen = events.len();

        let mut samples = Vec::with_capacity(events.len());
        let mut events_skipped = 0;
        for event in &events {
            let text = event.correction_text();
            match text {
                Some(text) if event.verdict.is_negative() => {
                    let c = categorize(text, event.category);
                    samples.push(FailureSample {
                        text: text.to_string(),
                        category: c.category,
                        confidence: c.confidence,
                        created_at: event.created_at,
                    });
                }
                _ => {
                    events_skipped += 1;
                    debug!(feedback_id = %event.id, "Skipping event without failure text");
                }
            }
        }

        let texts: Vec<String> = samples.iter().map(|s| s.text.clone()).collect();
        let batch = self.embedder.embed_all(&texts).await;
        let clustering = dbscan(&batch.vectors, self.config.eps, self.config.min_samples)?;

        let mut found: Vec<FailurePattern> = Vec::new();
        for members in clustering.clusters() {
            let refs: Vec<&FailureSample> = members.iter().map(|&i| &samples[i]).collect();
            found.extend(from_cluster(&refs));
        }

        let mut by_category: BTreeMap<FailureCategory, Vec<&FailureSample>> = BTreeMap::new();
        for sample in &samples {
            if sample.category != FailureCategory::Other {
                by_category.entry(sample.category).or_default().push(sample);
            }
        }
        for (category, members) in by_category {
            if members.len() >= self.config.min_samples {
                found.extend(from_category(category, &members));
            }
        }

        let (patterns_created, patterns_merged) = self.merge_and_store(found).await?;

        let report = ClusterReport {
            events_seen,
            events_skipped,
            clusters: clustering.cluster_count,
            noise: clustering.noise(),
            patterns_created,
            patterns_merged,
            embedding_space: batch.space,
            window_start,
            window_end,
        };
        info!(
            events = report.events_seen,
            skipped = report.events_skipped,
            clusters = report.clusters,
            noise = report.noise,
            created = report.patterns_created,
            merged = report.patterns_merged,
            space = ?report.embedding_space,
            "Clustering pass finished"
        );
        Ok(report)
    }

    /// Merges each new pattern into the most similar unresolved pattern above the
    /// merge threshold, or stores it as new.
    async fn merge_and_store(&self, found: Vec<FailurePattern>) -> BatchResult<(usize, usize)> {
        let mut known: Vec<FailurePattern> = self
            .store
            .list_patterns()
            .await?
            .into_iter()
            .filter(|p| !p.resolved)
            .collect();

        let (mut created, mut merged) = (0, 0);
        for pattern in found {
            let best = known
                .iter_mut()
                .map(|k| {
                    let score = merge_similarity(k, &pattern);
                    (k, score)
                })
                .filter(|(_, score)| *score > self.config.merge_threshold)
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

            match best {
                Some((existing, score)) => {
                    debug!(pattern = %existing.name, score, "Merging into existing pattern");
                    merge_into(existing, &pattern);
                    self.store.upsert_pattern(existing.clone()).await?;
                    self.stats.incr(Counter::PatternMerged);
                    merged += 1;
                }
                None => {
                    debug!(pattern = %pattern.name, "New failure pattern");
                    self.store.upsert_pattern(pattern.clone()).await?;
                    self.stats.incr(Counter::PatternCreated);
                    known.push(pattern);
                    created += 1;
                }
            }
        }
        Ok((created, merged))
    }
}
