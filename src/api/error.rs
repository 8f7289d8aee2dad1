//! Shared error handling for API endpoints.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use tracing::{error, warn};

use crate::careers::UpstreamError;
use crate::session::SessionError;
use crate::validation::{FieldErrors, NON_FIELD_ERRORS, expect_object};

/// Extension trait for concise upstream error mapping on Results.
pub trait ResultExt<T> {
    fn upstream_err(self, operation: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T, UpstreamError> {
    fn upstream_err(self, operation: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::upstream(operation, e))
    }
}

/// API error type with automatic response conversion.
#[derive(Debug)]
pub enum ApiError {
    Validation(FieldErrors),
    DuplicateContact,
    InvalidCredentials,
    LoginFailed,
    MissingRefreshToken,
    InvalidOrExpiredToken,
    Upstream {
        status: StatusCode,
        operation: &'static str,
    },
    Internal,
}

impl ApiError {
    pub fn upstream(operation: &'static str, e: UpstreamError) -> Self {
        match &e {
            UpstreamError::Status(_) => warn!(operation, error = %e, "Upstream request failed"),
            _ => error!(operation, error = %e, "Upstream request failed"),
        }
        let status = StatusCode::from_u16(e.status())
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        Self::Upstream { status, operation }
    }

    /// Map a session error from the login flow, where internal failures keep
    /// the `success` envelope.
    pub fn from_login(e: SessionError) -> Self {
        match ApiError::from(e) {
            ApiError::Internal => ApiError::LoginFailed,
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::DuplicateContact => StatusCode::CONFLICT,
            ApiError::InvalidCredentials
            | ApiError::MissingRefreshToken
            | ApiError::InvalidOrExpiredToken => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { status, .. } => *status,
            ApiError::LoginFailed | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        match self {
            ApiError::Validation(fields) => json!({"error": "Invalid input", "fields": fields}),
            ApiError::DuplicateContact => json!({"error": "This email is already in use."}),
            ApiError::InvalidCredentials => json!({
                "success": false,
                "error": "No active account found with the given credentials",
            }),
            ApiError::LoginFailed => json!({"success": false, "error": "Internal server error"}),
            ApiError::MissingRefreshToken => {
                json!({"refreshed": false, "error": "Refresh token not found"})
            }
            ApiError::InvalidOrExpiredToken => {
                json!({"refreshed": false, "error": "Token is invalid or expired"})
            }
            ApiError::Upstream { operation, .. } => {
                json!({"error": format!("{} failed", operation)})
            }
            ApiError::Internal => json!({"error": "Internal server error"}),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Validation(fields) => ApiError::Validation(fields),
            SessionError::DuplicateContact => ApiError::DuplicateContact,
            SessionError::InvalidCredentials => ApiError::InvalidCredentials,
            SessionError::MissingRefreshToken => ApiError::MissingRefreshToken,
            SessionError::InvalidOrExpiredToken => ApiError::InvalidOrExpiredToken,
            // Already logged where it happened
            SessionError::Internal(_) => ApiError::Internal,
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(fields: FieldErrors) -> Self {
        ApiError::Validation(fields)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Unwrap a JSON request body into an object, reporting malformed bodies as
/// validation errors.
pub fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    let Json(value) = body.map_err(|rejection| {
        ApiError::Validation(FieldErrors::single(NON_FIELD_ERRORS, rejection.body_text()))
    })?;
    Ok(expect_object(value)?)
}
