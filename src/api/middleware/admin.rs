//! `x-admin-token` gate for the restriction admin routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

pub async fn admin_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Routes are only mounted when a token is configured, but misconfigured
    // state must still fail closed.
    let expected = state
        .config
        .admin_token
        .as_deref()
        .ok_or_else(|| AppError::unauthorized("Admin access is disabled", json!({})))?;

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided != expected {
        return Err(AppError::unauthorized("Invalid admin token", json!({})));
    }

    Ok(next.run(req).await)
}
