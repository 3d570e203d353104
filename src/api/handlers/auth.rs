//! Auth handlers: OTP-gated registration, login, refresh, logout,
//! password reset and guest sessions. Tokens travel only in HttpOnly
//! cookies; response bodies carry the email and display name at most.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::auth::{
    AuthResponse, ForgotPasswordRequest, GenerateOtpRequest, GuestRequest, LoginRequest,
    MessageResponse, RegisterRequest, ResetPasswordRequest, VerifyOtpRequest,
};
use crate::application::services::AuthSession;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::cookies::{
    ACCESS_COOKIE, GUEST_COOKIE, REFRESH_COOKIE, build_cookie, clear_cookie, cookie_value,
};

fn refresh_cookie_from(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_value(header, REFRESH_COOKIE)
}

fn guest_cookie_from(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_value(header, GUEST_COOKIE)
}

/// Builds a response that sets both auth cookies.
fn session_response(status: StatusCode, session: &AuthSession, clear_guest: bool) -> Response {
    let mut response = (
        status,
        Json(AuthResponse {
            email: session.email.clone(),
            name: session.name.clone(),
        }),
    )
        .into_response();

    let mut cookies = vec![
        build_cookie(ACCESS_COOKIE, &session.access_token, session.access_ttl_secs),
        build_cookie(REFRESH_COOKIE, &session.refresh_token, session.refresh_ttl_secs),
    ];
    if clear_guest {
        cookies.push(clear_cookie(GUEST_COOKIE));
    }

    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

pub async fn generate_otp(
    State(state): State<AppState>,
    Json(payload): Json<GenerateOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    state
        .auth_service
        .generate_otp(&payload.email, &payload.password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Verification code sent",
    }))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    state.auth_service.verify_otp(&payload.email, &payload.otp)?;
    Ok(Json(MessageResponse {
        message: "Code verified",
    }))
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    // Display name defaults to the mailbox part of the email.
    let name = payload
        .name
        .clone()
        .unwrap_or_else(|| payload.email.split('@').next().unwrap_or("").to_string());

    let (user, session) = state
        .auth_service
        .register(&name, &payload.email, &payload.password, &payload.otp)
        .await?;

    let migrated_guest = match guest_cookie_from(&headers) {
        Some(guest_token) => {
            state
                .link_service
                .migrate_guest_urls(&guest_token, user.id)
                .await;
            true
        }
        None => false,
    };

    Ok(session_response(StatusCode::CREATED, &session, migrated_guest))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let (user, session) = state
        .auth_service
        .login(&payload.email, &payload.password)
        .await?;

    let migrated_guest = match guest_cookie_from(&headers) {
        Some(guest_token) => {
            state
                .link_service
                .migrate_guest_urls(&guest_token, user.id)
                .await;
            true
        }
        None => false,
    };

    Ok(session_response(StatusCode::OK, &session, migrated_guest))
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = refresh_cookie_from(&headers)
        .ok_or_else(|| AppError::unauthorized("Missing refresh cookie", json!({})))?;

    let session = state.auth_service.refresh(&token).await?;

    // Only the access cookie changes; the refresh token stays as issued.
    let mut response = (
        StatusCode::OK,
        Json(AuthResponse {
            email: session.email.clone(),
            name: session.name.clone(),
        }),
    )
        .into_response();

    let cookie = build_cookie(ACCESS_COOKIE, &session.access_token, session.access_ttl_secs);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    Ok(response)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state
        .auth_service
        .logout(refresh_cookie_from(&headers).as_deref())
        .await;

    let mut response = (
        StatusCode::OK,
        Json(MessageResponse {
            message: "Logged out",
        }),
    )
        .into_response();

    for cookie in [clear_cookie(ACCESS_COOKIE), clear_cookie(REFRESH_COOKIE)] {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    state.auth_service.forgot_password(&payload.email).await?;
    Ok(Json(MessageResponse {
        message: "If the account exists, a reset code was sent",
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;
    state
        .auth_service
        .reset_password(&payload.email, &payload.otp, &payload.password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}

pub async fn guest(
    State(state): State<AppState>,
    Json(payload): Json<GuestRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let (token, ttl_secs) = state.auth_service.guest(&payload.guest_id)?;

    let mut response = (
        StatusCode::OK,
        Json(json!({ "guestId": payload.guest_id })),
    )
        .into_response();

    let cookie = build_cookie(GUEST_COOKIE, &token, ttl_secs);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }

    Ok(response)
}
