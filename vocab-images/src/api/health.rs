//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("vocab-images")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Words resolved so far in this process
    pub cached_words: usize,
    /// Search providers in priority order
    pub providers: Vec<&'static str>,
    pub generation_enabled: bool,
    pub evaluation_enabled: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let status = state.pipeline.status();

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "vocab-images".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        cached_words: state.pipeline.cache().len().await,
        providers: status.providers,
        generation_enabled: status.strategies.contains(&"generated"),
        evaluation_enabled: status.evaluation_enabled,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
