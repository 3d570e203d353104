//! Public redirect handler.
//!
//! Resolves a short id and answers 302 Found. Every successful resolution
//! queues a click event; the channel is bounded and a full queue drops the
//! event rather than delaying the redirect. An unknown id renders a branded
//! HTML 404 page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::user_agent::{browser_family, device_family};

#[derive(Template, WebTemplate)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    short: String,
}

pub async fn redirect(
    State(state): State<AppState>,
    Path(short): Path<String>,
    headers: HeaderMap,
) -> Response {
    match state.link_service.resolve(&short).await {
        Ok(url) => {
            queue_click(&state, &short, &headers);
            (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
        }
        Err(AppError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, NotFoundTemplate { short }).into_response()
        }
        Err(e) => e.into_response(),
    }
}

fn queue_click(state: &AppState, short: &str, headers: &HeaderMap) {
    let event = click_event_from_headers(short, headers);

    if state.click_tx.try_send(event).is_err() {
        tracing::warn!(short, "Click queue full, dropping event");
    }
}

fn click_event_from_headers(short: &str, headers: &HeaderMap) -> ClickEvent {
    let header_str =
        |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("");

    let country = match header_str("cf-ipcountry") {
        "" => "unknown".to_string(),
        c => c.to_ascii_uppercase(),
    };

    // Referrers are bucketed by host to keep the analytics maps small.
    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| url::Url::parse(raw).ok())
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()));

    let user_agent = header_str("user-agent");

    ClickEvent {
        short: short.to_string(),
        country,
        referrer,
        browser: browser_family(user_agent).to_string(),
        device: device_family(user_agent).to_string(),
        at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_click_event_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-ipcountry", HeaderValue::from_static("de"));
        headers.insert(
            header::REFERER,
            HeaderValue::from_static("https://News.Ycombinator.com/item?id=1"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Gecko/20100101 Firefox/125.0"),
        );

        let event = click_event_from_headers("Ab3Cd9Ef", &headers);
        assert_eq!(event.country, "DE");
        assert_eq!(event.referrer.as_deref(), Some("news.ycombinator.com"));
        assert_eq!(event.browser, "Firefox");
        assert_eq!(event.device, "desktop");
    }

    #[test]
    fn test_click_event_defaults() {
        let event = click_event_from_headers("Ab3Cd9Ef", &HeaderMap::new());
        assert_eq!(event.country, "unknown");
        assert_eq!(event.referrer, None);
        assert_eq!(event.referrer_key(), "direct");
        assert_eq!(event.browser, "unknown");
        assert_eq!(event.device, "unknown");
    }
}
