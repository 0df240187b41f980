//! Safety Watch Dashboard Server
//!
//! Dashboard backend for PPE violation and fire/smoke detection events
//! produced by an external video-analysis service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SAFETY WATCH DASHBOARD                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────────┐  ┌───────────────────┐ │
//! │  │  API      │  │  Dashboard      │  │  Views            │ │
//! │  │  (Axum)   │─▶│  Shell          │─▶│  metrics / charts │ │
//! │  │           │  │  (poll loop)    │  │  logs / alerts    │ │
//! │  └───────────┘  └────────┬────────┘  └───────────────────┘ │
//! │                          ▼                                  │
//! │          ┌──────────────────────────────┐                   │
//! │          │ LiveBackend | Simulated      │                   │
//! │          └──────────────────────────────┘                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod dashboard;
mod error;
mod handlers;
mod logic;
mod models;
mod source;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use dashboard::Dashboard;
use logic::alert::{AudioCue, Silent, TerminalBell};
use source::{DataSource, SourceKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    init_logging(&config);

    tracing::info!("Safety Watch Dashboard starting...");
    tracing::info!("Data source: {}", config.source);
    if config.source == SourceKind::Live {
        tracing::info!("Detection backend: {}", config.backend_url);
    } else if config.is_production() {
        tracing::warn!("Running with SIMULATED detections in production");
    }

    // Build application state
    let source = DataSource::from_config(&config)?;
    let audio: Box<dyn AudioCue> = if config.audio_cue {
        Box::new(TerminalBell)
    } else {
        Box::new(Silent)
    };

    let state = AppState {
        dashboard: Arc::new(Dashboard::new(source, &config, audio)),
        config: config.clone(),
    };

    if config.auto_start {
        state.dashboard.start();
    }

    // Build router
    let app = create_router(state.clone());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.dashboard.stop();
    tracing::info!("Server stopped");
    Ok(())
}

fn init_logging(config: &config::Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "safety_dashboard=debug,tower_http=debug".into());

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let monitoring_routes = Router::new()
        .route("/api/v1/status", get(handlers::monitoring::status))
        .route("/api/v1/monitoring/start", post(handlers::monitoring::start))
        .route("/api/v1/monitoring/stop", post(handlers::monitoring::stop))
        .route("/api/v1/monitoring/retry", post(handlers::monitoring::retry));

    let view_routes = Router::new()
        // Detections
        .route("/api/v1/detections", get(handlers::detections::list))
        .route("/api/v1/detections/:id", get(handlers::detections::get))

        // Metrics & charts
        .route("/api/v1/metrics", get(handlers::metrics::summary))
        .route("/api/v1/charts/hourly", get(handlers::metrics::hourly))
        .route("/api/v1/charts/distribution", get(handlers::metrics::distribution))

        // Logs
        .route("/api/v1/logs", get(handlers::logs::list))
        .route("/api/v1/logs/export", get(handlers::logs::export))

        // Alerts
        .route("/api/v1/alerts", get(handlers::alerts::list));

    let backend_routes = Router::new()
        .route("/api/v1/backend/stats", get(handlers::backend::stats))
        .route("/api/v1/backend/test-audio", post(handlers::backend::test_audio));

    // CORS wide open only outside production
    let cors = if state.config.is_production() {
        CorsLayer::new()
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(monitoring_routes)
        .merge(view_routes)
        .merge(backend_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
