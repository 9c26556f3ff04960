use super::*;

use chrono::TimeDelta;

use crate::clustering::ClusterConfig;
use crate::consensus::{ConsensusConfig, ConsensusEngine, RaterAnswer};
use crate::embedding::FallbackEmbedder;
use crate::model::{QueryId, RaterId, Verdict};
use crate::recommend::RecommenderConfig;
use crate::store::InMemoryStore;

struct Harness {
    store: Arc<InMemoryStore>,
    stats: Arc<Stats>,
    tracker: Arc<ConsensusTracker<InMemoryStore>>,
    scheduler: Arc<BatchScheduler<InMemoryStore>>,
}

fn harness(interval: Duration) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let stats = Arc::new(Stats::new());
    let clustering = Arc::new(
        ClusteringJob::new(
            ClusterConfig::default(),
            store.clone(),
            FallbackEmbedder::lexical_only(),
            stats.clone(),
        )
        .unwrap(),
    );
    let recommender =
        Arc::new(Recommender::new(RecommenderConfig::default(), store.clone()).unwrap());
    let tracker = Arc::new(ConsensusTracker::new(
        ConsensusEngine::new(ConsensusConfig::default()).unwrap(),
        store.clone(),
        stats.clone(),
    ));
    let scheduler = Arc::new(
        BatchScheduler::new(
            interval,
            clustering,
            recommender,
            tracker.clone(),
            stats.clone(),
        )
        .unwrap(),
    );
    Harness {
        store,
        stats,
        tracker,
        scheduler,
    }
}

#[tokio::test]
async fn test_run_once_on_empty_store() {
    let h = harness(Duration::from_secs(60));
    let report = h.scheduler.run_once().await;

    assert_eq!(report.failures, 0);
    assert_eq!(report.clustering.map(|c| c.events_seen), Some(0));
    assert_eq!(report.recommendations, 0);
    assert_eq!(h.stats.batch_runs(), 1);
    assert_eq!(h.stats.batch_failures(), 0);
}

#[tokio::test]
async fn test_run_once_isolates_failures() {
    let h = harness(Duration::from_secs(60));
    h.store.set_available(false);

    let report = h.scheduler.run_once().await;
    assert!(report.clustering.is_none());
    assert_eq!(report.failures, 2);
    assert_eq!(h.stats.batch_failures(), 2);

    h.store.set_available(true);
    let report = h.scheduler.run_once().await;
    assert_eq!(report.failures, 0);
    assert_eq!(h.stats.batch_runs(), 2);
}

#[tokio::test]
async fn test_run_once_expires_stale_sessions() {
    let h = harness(Duration::from_secs(60));
    let query = QueryId::new();
    let answer = RaterAnswer {
        rater_id: RaterId::new(),
        trust_score: 0.9,
        confidence: 1.0,
        verdict: Verdict::Correct,
        answer: "Five percent".to_string(),
        corrected: false,
        submitted_at: Utc::now() - TimeDelta::hours(49),
    };
    h.tracker.record(query, answer).await.unwrap();
    assert_eq!(h.tracker.open_sessions(), 1);

    let report = h.scheduler.run_once().await;
    assert_eq!(report.expired_sessions, 1);
    assert_eq!(h.tracker.open_sessions(), 0);
    assert_eq!(h.stats.consensus_expired(), 1);
}

#[tokio::test]
async fn test_start_is_idempotent_and_shutdown_stops_loop() {
    let h = harness(Duration::from_millis(10));
    let handle = h.scheduler.start();

    let second = h.scheduler.start();
    tokio::time::timeout(Duration::from_secs(1), second)
        .await
        .expect("duplicate start returns a finished task")
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while h.stats.batch_runs() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("scheduler ticks");

    h.scheduler.shutdown();
    h.scheduler.shutdown();
    assert!(h.scheduler.is_shutdown_initiated());
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop exits after shutdown")
        .unwrap();
}

#[test]
fn test_zero_interval_is_rejected() {
    let h = harness(Duration::from_secs(1));
    let err = BatchScheduler::new(
        Duration::ZERO,
        Arc::new(
            ClusteringJob::new(
                ClusterConfig::default(),
                h.store.clone(),
                FallbackEmbedder::lexical_only(),
                h.stats.clone(),
            )
            .unwrap(),
        ),
        Arc::new(Recommender::new(RecommenderConfig::default(), h.store.clone()).unwrap()),
        h.tracker.clone(),
        h.stats.clone(),
    )
    .unwrap_err();
    assert!(matches!(err, BatchProcessingError::ConfigError { .. }));
}
