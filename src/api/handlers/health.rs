//! Liveness/readiness endpoint.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            "down"
        }
    };

    Json(json!({
        "status": if database == "up" { "ok" } else { "degraded" },
        "database": database,
        "clickQueue": {
            "capacity": state.click_queue_capacity,
            "available": state.click_tx.capacity(),
        },
    }))
}
