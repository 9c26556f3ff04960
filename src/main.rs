//! Golden feedback HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use golden::config::Config;
use golden::embedding::{Embedder, FallbackEmbedder, HttpEmbedder, LexicalEmbedder};
use golden::gateway::{HandlerState, create_router_with_state};
use golden::{
    BatchScheduler, ClusteringJob, ConsensusEngine, ConsensusTracker, FeedbackIntake, GoldenCache,
    InMemoryStore, Recommender, Stats,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "Golden feedback service starting"
    );

    let store = Arc::new(InMemoryStore::new());
    let stats = Arc::new(Stats::new());

    let embedder: Arc<dyn Embedder> = match &config.embedder_url {
        Some(url) => Arc::new(HttpEmbedder::new(url)?),
        None => {
            tracing::warn!("No GOLDEN_EMBEDDER_URL configured, using lexical embeddings only");
            Arc::new(LexicalEmbedder::default())
        }
    };
    let embedder_name = embedder.name().to_string();
    let fallback = FallbackEmbedder::new(embedder.clone());

    let golden = Arc::new(GoldenCache::new(
        config.golden_config(),
        store.clone(),
        embedder,
        stats.clone(),
    )?);

    let engine = ConsensusEngine::new(config.consensus_config())?.with_embedder(fallback.clone());
    let tracker = Arc::new(
        ConsensusTracker::new(engine, store.clone(), stats.clone()).with_golden(golden.clone()),
    );

    let intake = Arc::new(FeedbackIntake::new(
        config.intake_config(),
        store.clone(),
        golden.clone(),
        tracker.clone(),
        stats.clone(),
    )?);

    let clustering = Arc::new(ClusteringJob::new(
        config.cluster_config(),
        store.clone(),
        fallback,
        stats.clone(),
    )?);
    let recommender = Arc::new(Recommender::new(config.recommender_config(), store.clone())?);

    let scheduler = Arc::new(BatchScheduler::new(
        config.batch_interval,
        clustering,
        recommender.clone(),
        tracker,
        stats.clone(),
    )?);

    let state = HandlerState::new(intake, golden.clone(), recommender, stats, embedder_name);
    let app = create_router_with_state(state.clone());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    match golden.warm().await {
        Ok(loaded) => tracing::info!(entries = loaded, "Golden set warmed"),
        Err(e) => tracing::warn!(error = %e, "Failed to warm golden set. Starting empty."),
    }
    state.mark_warmed();

    let batch = scheduler.start();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(scheduler.clone()))
        .await?;

    if let Err(e) = batch.await {
        tracing::error!(error = %e, "Batch scheduler task failed");
    }

    tracing::info!("Golden feedback shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("GOLDEN_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal<S: golden::FeedbackStore>(scheduler: Arc<BatchScheduler<S>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    scheduler.shutdown();
    tracing::info!("Batch scheduler stopped");
}
