//! Restriction administration handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;

use crate::error::AppError;
use crate::infrastructure::cache::Restriction;
use crate::state::AppState;

pub async fn list_restrictions(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Json<Vec<Restriction>> {
    Json(state.restrictions.list_by_kind(&kind))
}

pub async fn delete_restriction(
    State(state): State<AppState>,
    Path((kind, identifier)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.restrictions.remove(&kind, &identifier) {
        return Err(AppError::not_found(
            "No such restriction",
            json!({ "type": kind, "identifier": identifier }),
        ));
    }

    tracing::info!(kind, identifier, "Restriction lifted");
    Ok(Json(json!({ "removed": true })))
}

pub async fn clear_restrictions(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cleared = state.restrictions.clear_all();
    tracing::info!(cleared, "All restrictions cleared");
    Json(json!({ "cleared": cleared }))
}
