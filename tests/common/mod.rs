//! Shared harness for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use golden::clustering::ClusterConfig;
use golden::consensus::ConsensusConfig;
use golden::embedding::{Embedder, FallbackEmbedder, MockEmbedder};
use golden::gateway::{HandlerState, create_router_with_state};
use golden::golden::GoldenConfig;
use golden::intake::IntakeConfig;
use golden::model::{QueryRecord, RaterProfile};
use golden::recommend::RecommenderConfig;
use golden::store::FeedbackStore;
use golden::{
    BatchScheduler, ClusteringJob, ConsensusEngine, ConsensusTracker, FeedbackIntake,
    FeedbackSubmission, GoldenCache, GoldenLookup, InMemoryStore, Recommender, Stats,
};

/// Every component wired over one in-memory store, as the binary wires them.
pub struct Stack {
    pub store: Arc<InMemoryStore>,
    pub stats: Arc<Stats>,
    pub golden: Arc<GoldenCache<InMemoryStore>>,
    pub tracker: Arc<ConsensusTracker<InMemoryStore>>,
    pub intake: Arc<FeedbackIntake<InMemoryStore>>,
    pub recommender: Arc<Recommender<InMemoryStore>>,
    pub scheduler: Arc<BatchScheduler<InMemoryStore>>,
}

impl Stack {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let stats = Arc::new(Stats::new());
        let embedder: Arc<dyn Embedder> = Arc::new(MockEmbedder::new());
        let fallback = FallbackEmbedder::new(embedder.clone());

        let golden = Arc::new(
            GoldenCache::new(
                GoldenConfig::default(),
                store.clone(),
                embedder,
                stats.clone(),
            )
            .expect("golden cache"),
        );
        let tracker = Arc::new(
            ConsensusTracker::new(
                ConsensusEngine::new(ConsensusConfig::default())
                    .expect("consensus engine")
                    .with_embedder(fallback.clone()),
                store.clone(),
                stats.clone(),
            )
            .with_golden(golden.clone()),
        );
        let intake = Arc::new(
            FeedbackIntake::new(
                IntakeConfig::default(),
                store.clone(),
                golden.clone(),
                tracker.clone(),
                stats.clone(),
            )
            .expect("intake"),
        );
        let clustering = Arc::new(
            ClusteringJob::new(
                ClusterConfig::default(),
                store.clone(),
                fallback,
                stats.clone(),
            )
            .expect("clustering job"),
        );
        let recommender = Arc::new(
            Recommender::new(RecommenderConfig::default(), store.clone()).expect("recommender"),
        );
        let scheduler = Arc::new(
            BatchScheduler::new(
                Duration::from_secs(3600),
                clustering,
                recommender.clone(),
                tracker.clone(),
                stats.clone(),
            )
            .expect("scheduler"),
        );

        Self {
            store,
            stats,
            golden,
            tracker,
            intake,
            recommender,
            scheduler,
        }
    }

    pub fn handler_state(&self) -> HandlerState<InMemoryStore> {
        HandlerState::new(
            self.intake.clone(),
            self.golden.clone(),
            self.recommender.clone(),
            self.stats.clone(),
            "mock",
        )
    }

    /// Registers a verified rater whose trust clamps to 1.0.
    pub async fn expert(&self, name: &str) -> RaterProfile {
        self.rater(RaterProfile::onboard(
            name,
            vec![
                "phd".to_string(),
                "certified_expert".to_string(),
                "senior_reviewer".to_string(),
            ],
            20.0,
            vec!["tax".into(), "vat".into(), "audit".into(), "payroll".into(), "law".into()],
            1.0,
            60.0,
        ))
        .await
    }

    /// Registers a verified rater who passes the trust gate but is not trusted
    /// enough for auto-approval (about 0.78).
    pub async fn reviewer(&self, name: &str) -> RaterProfile {
        self.rater(RaterProfile::onboard(
            name,
            vec!["senior_reviewer".to_string(), "masters".to_string()],
            15.0,
            vec!["tax".into(), "vat".into(), "audit".into()],
            0.9,
            120.0,
        ))
        .await
    }

    async fn rater(&self, profile: RaterProfile) -> RaterProfile {
        let profile = profile.verify();
        self.store
            .create_rater(profile.clone())
            .await
            .expect("create rater");
        profile
    }

    pub async fn query(&self, question: &str, answer: &str) -> QueryRecord {
        let record = QueryRecord::new(question, answer);
        self.store
            .put_query(record.clone())
            .await
            .expect("put query");
        record
    }

    /// Polls the golden cache until `question` hits or the attempts run out.
    pub async fn wait_for_hit(&self, question: &str) -> GoldenLookup {
        let mut lookup = GoldenLookup::miss();
        for _ in 0..200 {
            lookup = self.golden.lookup(question).await;
            if lookup.hit {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        lookup
    }
}

pub fn submission(
    query: &QueryRecord,
    rater: &RaterProfile,
    verdict: &str,
    category: Option<&str>,
    correction: Option<&str>,
) -> FeedbackSubmission {
    FeedbackSubmission {
        query_id: Some(query.id.to_string()),
        rater_id: Some(rater.id.to_string()),
        verdict: Some(verdict.to_string()),
        category: category.map(str::to_string),
        correction: correction.map(str::to_string),
        confidence: Some(1.0),
        time_spent_seconds: Some(60.0),
    }
}

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub stack: Stack,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_test_server() -> anyhow::Result<TestServer> {
    let stack = Stack::new();
    let state = stack.handler_state();
    stack.golden.warm().await?;
    state.mark_warmed();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router_with_state(state);
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        addr,
        stack,
        handle,
    })
}
