//! Water-Quality Classification API Server
//!
//! HTTP surface over the classifier and result store: one endpoint to
//! classify and persist a sensor sample, one to look up latest results.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod config;
mod error;
mod routes;

pub use error::ApiError;

use classifier::{cached_classifier, Classifier, ModelBackend};
use storage::ResultRepository;

use crate::config::AppConfig;

/// Application state shared across handlers.
///
/// The classifier handle is the process-wide cached model: written once
/// at startup, thereafter only read.
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub repository: ResultRepository,
    pub backend: String,
    pub version: String,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(classifier: Arc<Classifier>, repository: ResultRepository, backend: &str) -> Self {
        Self {
            classifier,
            repository,
            backend: backend.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub backend: String,
    pub stored_results: i64,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/classification-data/", post(routes::classify::classify))
        .route("/get-result/", get(routes::results::get_result))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stored_results = state.repository.result_count().await.unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        backend: state.backend.clone(),
        stored_results,
    })
}

/// Initialize logging
pub fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}

/// Run the server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let backend: ModelBackend = config
        .model_backend
        .parse()
        .map_err(anyhow::Error::msg)?;

    let classifier = cached_classifier(config.model_path.as_deref(), backend)?;

    let repository = ResultRepository::connect(&config.database_url).await?;
    repository.init_schema().await?;

    let state = Arc::new(AppState::new(classifier, repository, &config.model_backend));
    let app = create_router(state);

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
