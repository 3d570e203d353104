//! Application error taxonomy and HTTP mapping.
//!
//! Every failure a handler can produce is an [`AppError`] variant carrying a
//! human-readable message plus structured JSON details. Responses follow the
//! shape `{"error": {"code", "message", "details"}}`. Internal errors never
//! leak their details to clients; they are logged server-side instead.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Wire representation of a single error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    Forbidden { message: String, details: Value },
    /// Refresh-session failures; the original API contract uses 406 here.
    NotAcceptable { message: String, details: Value },
    NotFound { message: String, details: Value },
    Conflict { message: String, details: Value },
    RateLimited {
        message: String,
        retry_after_secs: u64,
        details: Value,
    },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn not_acceptable(message: impl Into<String>, details: Value) -> Self {
        Self::NotAcceptable {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after_secs: u64) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_secs,
            details: json!({ "retryAfter": retry_after_secs }),
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Converts the error into its wire form, stripping internal details.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (code, message, details) = match self {
            Self::Validation { message, details } => ("validation_error", message, details),
            Self::Unauthorized { message, details } => ("unauthorized", message, details),
            Self::Forbidden { message, details } => ("forbidden", message, details),
            Self::NotAcceptable { message, details } => ("not_acceptable", message, details),
            Self::NotFound { message, details } => ("not_found", message, details),
            Self::Conflict { message, details } => ("conflict", message, details),
            Self::RateLimited {
                message, details, ..
            } => ("rate_limited", message, details),
            Self::Internal { message, .. } => {
                return ErrorInfo {
                    code: "internal_error",
                    message: message.clone(),
                    details: json!({}),
                };
            }
        };

        ErrorInfo {
            code,
            message: message.clone(),
            details: details.clone(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotAcceptable { .. } => StatusCode::NOT_ACCEPTABLE,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let info = self.to_error_info();
        write!(f, "{}: {}", info.code, info.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Self::Internal { message, details } = &self {
            tracing::error!(%message, %details, "internal error");
        }

        let status = self.status();
        let retry_after = match &self {
            Self::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::bad_request(
            "Request validation failed",
            serde_json::to_value(&errors).unwrap_or_else(|_| json!({})),
        )
    }
}

/// Maps a database error to the application taxonomy.
///
/// Unique-constraint violations become conflicts; everything else is an
/// internal error with the driver detail kept server-side only.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }
    }

    AppError::internal("Database error", json!({ "source": e.to_string() }))
}

/// True when the error is a unique violation on the short identifier column.
///
/// Used by the creation path to tell a retryable id collision apart from
/// other database failures.
pub fn is_unique_violation_on_short(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some("links_short_key"))
}
