//! Model listing endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::models::ModelId;
use crate::AppState;

/// One selectable model
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: ModelId,
    pub name: &'static str,
    pub description: &'static str,
    pub is_default: bool,
}

/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelInfo>> {
    Json(
        ModelId::ALL
            .into_iter()
            .map(|id| ModelInfo {
                id,
                name: id.display_name(),
                description: id.description(),
                is_default: id == state.default_model,
            })
            .collect(),
    )
}

pub fn model_routes() -> Router<AppState> {
    Router::new().route("/api/models", get(list_models))
}
