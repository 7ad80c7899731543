//! # Delivery Tracker Main Entry Point

use std::sync::Arc;

use anyhow::Context;
use delivery_tracker::{
    config::ConfigLoader,
    db::MemoryStore,
    processing::{MockExtractor, ProcessingQueue, ProcessingWorker},
    seeds::seed_demo_data,
    server::{AppState, run_server},
    telemetry,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = Arc::new(ConfigLoader::new().load()?);
    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(configuration = %redacted_json, "Effective configuration");
    }

    let store = MemoryStore::shared();
    if config.seed_demo_data {
        seed_demo_data(&store)
            .await
            .context("failed to seed demo data")?;
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create upload dir {}", config.upload_dir.display()))?;

    let shutdown = CancellationToken::new();
    let (processing, jobs) =
        ProcessingQueue::channel(config.processing.queue_capacity, store.clone());
    let worker = ProcessingWorker::new(
        store.clone(),
        Arc::new(MockExtractor),
        config.processing.clone(),
    );
    let worker_handle = tokio::spawn(worker.run(jobs, shutdown.clone()));

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        signal_token.cancel();
    });

    let state = AppState {
        config: config.clone(),
        store,
        processing,
    };
    let served = run_server(config, state, shutdown.clone()).await;

    shutdown.cancel();
    if let Err(err) = worker_handle.await {
        tracing::error!(error = ?err, "Processing worker task failed");
    }

    served
}
