//! URL management handlers (create, list, delete).

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::url::{CreateUrlRequest, ListQuery, ListResponse, UrlResponse};
use crate::api::middleware::Identity;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_url(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateUrlRequest>,
) -> Result<(StatusCode, Json<UrlResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .create(
            &payload.full_url,
            payload.alias.as_deref(),
            identity.attribution(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

pub async fn list_urls(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let page = state
        .link_service
        .list(
            &identity.attribution(),
            query.page.unwrap_or(1),
            query.limit.unwrap_or(10),
        )
        .await?;

    Ok(Json(ListResponse {
        data: page.data.into_iter().map(UrlResponse::from).collect(),
        has_more: page.has_more,
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_urls: page.total_urls,
    }))
}

pub async fn delete_url(
    State(state): State<AppState>,
    identity: Identity,
    Path(short): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .link_service
        .delete(&short, &identity.attribution())
        .await?;

    Ok(Json(serde_json::json!({ "message": "deleted", "short": short })))
}
