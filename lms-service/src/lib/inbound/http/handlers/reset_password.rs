use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::FieldViolation;
use crate::account::models::EmailAddress;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::EnrollmentStore;
use crate::inbound::http::router::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

/// Pre-auth recovery endpoint: no token required, by design. Its purpose
/// is to unblock a first login, so it runs before any session exists.
pub async fn reset_password<AR: AccountRepository, ES: EnrollmentStore>(
    State(state): State<AppState<AR, ES>>,
    Json(body): Json<ResetPasswordRequestBody>,
) -> Result<ApiSuccess<ResetPasswordResponseData>, ApiError> {
    let mut violations = Vec::new();

    // Absent fields join the structured 400 list, same as invalid ones.
    let email = match EmailAddress::new(body.email.unwrap_or_default()) {
        Ok(email) => Some(email),
        Err(e) => {
            violations.push(FieldViolation {
                field: "email",
                message: e.to_string(),
            });
            None
        }
    };

    let new_password = body.new_password.unwrap_or_default();
    if new_password.len() < MIN_PASSWORD_LENGTH {
        violations.push(FieldViolation {
            field: "newPassword",
            message: format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        });
    }

    let Some(email) = email else {
        return Err(ApiError::Validation(violations));
    };
    if !violations.is_empty() {
        return Err(ApiError::Validation(violations));
    }

    state
        .account_service
        .reset_password(&email, &new_password)
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ResetPasswordResponseData {
            message: "Password reset successful. Please login again.".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequestBody {
    email: Option<String>,
    #[serde(rename = "newPassword")]
    new_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPasswordResponseData {
    pub message: String,
}
