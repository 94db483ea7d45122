//! Metadata generation endpoints
//!
//! Both endpoints always answer 200 with a [`GeneratedMetadata`] once the
//! request itself is valid. Generation failures are reported in-band with the
//! sentinel title "Generation Failed".

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::info;
use tunesmith_common::config::MAX_RETRIES_LIMIT;

use crate::models::{GeneratedMetadata, ModelId};
use crate::{ApiError, ApiResult, AppState};

/// Request payload for POST /api/metadata/generate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Creative brief
    pub topic: String,
    /// Optional style description
    #[serde(default)]
    pub style: String,
    /// Model id; the service default when absent
    pub model: Option<String>,
    /// Retry failed generations (default true)
    #[serde(default = "default_retry")]
    pub retry: bool,
    /// Retries after the first attempt; the service default when absent
    pub max_retries: Option<u32>,
}

fn default_retry() -> bool {
    true
}

/// Request payload for POST /api/metadata/enhance
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceRequest {
    #[serde(default)]
    pub current_style: String,
    #[serde(default)]
    pub current_lyrics: String,
    pub model: Option<String>,
}

fn resolve_model(requested: Option<&str>, default: ModelId) -> ApiResult<ModelId> {
    match requested.map(str::trim).filter(|m| !m.is_empty()) {
        Some(id) => Ok(id.parse()?),
        None => Ok(default),
    }
}

/// POST /api/metadata/generate
///
/// **Request:**
/// `{"topic": "a rainy city night", "style": "synthwave", "model": "gemini-2.5-flash"}`
///
/// **Errors:**
/// - 400 Bad Request: empty topic, unknown model, too many retries
pub async fn generate_metadata(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> ApiResult<Json<GeneratedMetadata>> {
    if payload.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("topic cannot be empty".to_string()));
    }
    let model = resolve_model(payload.model.as_deref(), state.default_model)?;
    if let Some(requested) = payload.max_retries {
        if requested > MAX_RETRIES_LIMIT {
            return Err(ApiError::BadRequest(format!(
                "maxRetries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }
    }
    let max_retries = payload.max_retries.unwrap_or(state.max_retries);

    info!(%model, retry = payload.retry, "Metadata generation requested");

    let record = if payload.retry {
        state
            .generator
            .generate_with_retry(&payload.topic, &payload.style, model, max_retries)
            .await
    } else {
        state
            .generator
            .generate(&payload.topic, &payload.style, model)
            .await
    };

    Ok(Json(record))
}

/// POST /api/metadata/enhance
///
/// **Request:** `{"currentStyle": "lofi", "currentLyrics": "[Verse]\n..."}`
///
/// **Errors:**
/// - 400 Bad Request: both style and lyrics empty, unknown model
pub async fn enhance_metadata(
    State(state): State<AppState>,
    Json(payload): Json<EnhanceRequest>,
) -> ApiResult<Json<GeneratedMetadata>> {
    if payload.current_style.trim().is_empty() && payload.current_lyrics.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "currentStyle or currentLyrics is required".to_string(),
        ));
    }
    let model = resolve_model(payload.model.as_deref(), state.default_model)?;

    info!(
        %model,
        has_lyrics = !payload.current_lyrics.trim().is_empty(),
        "Metadata enhancement requested"
    );

    let record = state
        .generator
        .enhance(&payload.current_style, &payload.current_lyrics, model)
        .await;

    Ok(Json(record))
}

/// Build metadata routes
pub fn metadata_routes() -> Router<AppState> {
    Router::new()
        .route("/api/metadata/generate", post(generate_metadata))
        .route("/api/metadata/enhance", post(enhance_metadata))
}
