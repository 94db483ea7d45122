//! tunesmith-ai library interface
//!
//! Song metadata generation (title, lyrics, style tags, tempo, key, time
//! signature) backed by the Gemini API, plus the HTTP routes that expose it.

pub mod api;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::models::ModelId;
use crate::services::{MetadataGenerator, DEFAULT_MAX_RETRIES};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Generator with its injected backend
    pub generator: MetadataGenerator,
    /// Model used when a request names none
    pub default_model: ModelId,
    /// Retries used when a request names none
    pub max_retries: u32,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(generator: MetadataGenerator) -> Self {
        Self {
            generator,
            default_model: ModelId::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            startup_time: Utc::now(),
        }
    }

    pub fn with_default_model(mut self, model: ModelId) -> Self {
        self.default_model = model;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::metadata_routes())
        .merge(api::model_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
