mod api;
mod config;
mod locations;
mod sentiment;
mod storage;

use crate::api::{AppState, health_handler};
use crate::config::AppConfig;
use crate::sentiment::{SentimentScorer, VaderScorer};
use crate::storage::ReviewStore;
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("🚀 Starting Review Sentiment API Server");

    // Load configuration
    let config = AppConfig::load()?;
    info!("📋 Configuration loaded");
    info!("   - Review data: {:?}", config.storage.reviews_path);
    info!("   - Server: {}:{}", config.server.host, config.server.port);

    // Load the review collection; refuse to serve without it
    info!("💾 Loading review data...");
    let store = Arc::new(ReviewStore::load(&config.storage.reviews_path)?);
    info!("✅ Review store ready ({} reviews)", store.len());
    if store.is_empty() {
        warn!("Review store is empty, listings will return no results");
    }

    // Initialize sentiment scorer
    let scorer: Arc<dyn SentimentScorer> = Arc::new(VaderScorer::new());
    info!("✅ Sentiment scorer ready");

    // Create application state
    let state = AppState { store, scorer };

    // Build router with modular routes
    let app = Router::new()
        .route("/health", get(health_handler))
        .merge(api::reviews::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📡 Available endpoints:");
    info!("   GET  /health   - Health check");
    info!("   GET  /         - List reviews (location, start_date, end_date)");
    info!("   POST /         - Submit a review (Location, ReviewBody)");
    info!("");
    info!("✨ Server is ready to accept requests!");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutting down gracefully");

    Ok(())
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("🛑 Shutdown signal received");
}
