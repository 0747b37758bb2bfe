use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::account::errors::AuthError;

pub mod dashboard;
pub mod import_csv;
pub mod login;
pub mod reset_password;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// One violation in a 400 validation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 400 with the structured list of violations. Never a security event.
    Validation(Vec<FieldViolation>),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    /// 403 with an explicit `RESET_PASSWORD` action hint: a workflow
    /// state, not a security event.
    ResetRequired,
    InternalServerError(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Validation failed", "errors": errors })),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": message })),
            )
                .into_response(),
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, Json(json!({ "message": message }))).into_response()
            }
            ApiError::ResetRequired => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "message": "Password reset required on first login",
                    "action": "RESET_PASSWORD",
                })),
            )
                .into_response(),
            ApiError::InternalServerError(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": message })),
            )
                .into_response(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // Generic on purpose: must not reveal whether the email existed.
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::ResetRequired => ApiError::ResetRequired,
            AuthError::InvalidEmail(_) | AuthError::InvalidAccountId(_) => {
                ApiError::BadRequest(err.to_string())
            }
            // Reset against a missing email surfaces as a store failure,
            // matching the reference; the import taxonomy maps whole-batch.
            AuthError::AccountNotFound(_)
            | AuthError::Password(_)
            | AuthError::Token(_)
            | AuthError::Import(_)
            | AuthError::StoreFailure(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}
