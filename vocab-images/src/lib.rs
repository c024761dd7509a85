//! vocab-images library interface
//!
//! Image sourcing for the vocabulary flashcards: catalog, cache, provider
//! clients, evaluator, pipeline and the HTTP API in front of them.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::ImagePipeline;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Image resolution pipeline (owns the word cache)
    pub pipeline: Arc<ImagePipeline>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: ImagePipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::image_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
