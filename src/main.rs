mod cluster;
mod config;
mod error;
mod handlers;
mod health;
mod metrics;
mod models;
mod reclaim;
mod registry;
mod scan;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use cluster::client::KubeCluster;
use config::Settings;
use handlers::AppState;
use health::Health;
use metrics::Metrics;
use registry::StuckRegistry;
use scan::ScanContext;

#[tokio::main]
async fn main() {
    let settings = Settings::parse();

    let default_filter = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("starting k8s-deletion-inspector");

    let cluster = match KubeCluster::connect(&settings.kubeconfig).await {
        Ok(cluster) => Arc::new(cluster),
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to cluster");
            std::process::exit(1);
        }
    };

    let metrics = match Metrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            tracing::error!(error = %e, "failed to set up metrics");
            std::process::exit(1);
        }
    };
    let registry = Arc::new(StuckRegistry::new());
    let health = Arc::new(Health::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let ctx = ScanContext {
        cluster,
        registry: Arc::clone(&registry),
        metrics: Arc::clone(&metrics),
        health: Arc::clone(&health),
        delete_after: settings.delete_after(),
        interval: settings.scan_interval(),
    };
    tokio::spawn(async move {
        // A scan loop error means cluster access is gone; restart-on-crash is
        // the recovery mechanism.
        if let Err(e) = scan::run_loop(ctx, shutdown_rx).await {
            tracing::error!(error = %e, "scan loop failed");
            std::process::exit(1);
        }
    });

    let app = handlers::router(AppState {
        registry,
        metrics,
        health,
    });
    let addr = format!("0.0.0.0:{}", settings.metrics_port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr, "failed to bind metrics server");
            std::process::exit(1);
        }
    };
    tracing::info!(addr, "metrics server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
    {
        tracing::error!(error = %e, "metrics server failed");
        std::process::exit(1);
    }
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
}
