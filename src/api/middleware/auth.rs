//! Request identity from auth cookies.
//!
//! A valid `accessToken` cookie yields `Identity::User`; failing that, a
//! valid `guestId` cookie yields `Identity::Guest`. Handlers that need an
//! identity take it as an extractor and get a 401 when neither is present.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::domain::entities::Attribution;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookies::{ACCESS_COOKIE, GUEST_COOKIE, cookie_value};

#[derive(Debug, Clone)]
pub enum Identity {
    User { id: i64, email: String },
    Guest(String),
}

impl Identity {
    pub fn attribution(&self) -> Attribution {
        match self {
            Self::User { id, .. } => Attribution::Owner(*id),
            Self::Guest(guest_id) => Attribution::Guest(guest_id.clone()),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            AppError::unauthorized("Sign in or start a guest session first", json!({}))
        })
    }
}

/// Resolves the request identity from cookies and stashes it as an
/// extension. Anonymous requests pass through without one.
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if let Some(identity) = resolve_identity(&state, cookie_header) {
        req.extensions_mut().insert(identity);
    }

    next.run(req).await
}

fn resolve_identity(state: &AppState, cookie_header: &str) -> Option<Identity> {
    if let Some(token) = cookie_value(cookie_header, ACCESS_COOKIE) {
        if let Ok(claims) = state.tokens.verify_access(&token) {
            return Some(Identity::User {
                id: claims.uid,
                email: claims.sub,
            });
        }
    }

    if let Some(token) = cookie_value(cookie_header, GUEST_COOKIE) {
        if let Ok(claims) = state.tokens.verify_guest(&token) {
            return Some(Identity::Guest(claims.sub));
        }
    }

    None
}
