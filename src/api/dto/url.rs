//! Request/response shapes for the URL management endpoints.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use validator::Validate;

use crate::domain::entities::ShortLink;

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{4,12}$").expect("alias regex"));

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    #[serde(rename = "fullURL")]
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub full_url: String,
    #[validate(regex(
        path = *ALIAS_RE,
        message = "Alias must be 4-12 characters of letters, digits, '-' or '_'"
    ))]
    pub alias: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlResponse {
    pub short: String,
    pub full: String,
    pub clicks: i64,
    pub last_clicked: Option<DateTime<Utc>>,
}

impl From<ShortLink> for UrlResponse {
    fn from(link: ShortLink) -> Self {
        Self {
            short: link.short,
            full: link.full_url,
            clicks: link.clicks,
            last_clicked: link.last_clicked,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub data: Vec<UrlResponse>,
    pub has_more: bool,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_urls: i64,
}
