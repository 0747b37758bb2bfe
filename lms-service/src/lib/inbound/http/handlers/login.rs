use auth::Role;
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

pub async fn login<AR: AccountRepository, ES: EnrollmentStore>(
    State(state): State<AppState<AR, ES>>,
    Json(body): Json<LoginRequestBody>,
) -> Result<ApiSuccess<LoginResponseData>, ApiError> {
    let mut violations = Vec::new();

    // Absent and empty fields are the same violation: both join the
    // structured 400 list instead of failing body extraction.
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    if email.is_empty() {
        violations.push(FieldViolation {
            field: "email",
            message: "Email is required".to_string(),
        });
    } else if let Err(e) = EmailAddress::new(email.clone()) {
        violations.push(FieldViolation {
            field: "email",
            message: e.to_string(),
        });
    }

    if password.is_empty() {
        violations.push(FieldViolation {
            field: "password",
            message: "Password is required".to_string(),
        });
    }

    if !violations.is_empty() {
        return Err(ApiError::Validation(violations));
    }

    let outcome = state.account_service.login(&email, &password).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LoginResponseData {
            message: "Login successful".to_string(),
            token: outcome.token,
            role: outcome.role,
            user_id: outcome.account_id.to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequestBody {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub message: String,
    pub token: String,
    pub role: Role,
    #[serde(rename = "userId")]
    pub user_id: String,
}
