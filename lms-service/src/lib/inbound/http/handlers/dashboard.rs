use auth::Role;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;
use serde_json::json;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::Dashboard;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::EnrollmentStore;
use crate::inbound::http::middleware::AuthenticatedAccount;
use crate::inbound::http::router::AppState;

pub async fn dashboard<AR: AccountRepository, ES: EnrollmentStore>(
    State(state): State<AppState<AR, ES>>,
    Extension(caller): Extension<AuthenticatedAccount>,
) -> Result<ApiSuccess<DashboardResponseData>, ApiError> {
    let dashboard = state.account_service.dashboard(&caller.claims).await?;

    let counts = match dashboard {
        Dashboard::Admin {
            total_students,
            total_tutors,
        } => json!({
            "totalStudents": total_students,
            "totalTutors": total_tutors,
        }),
        Dashboard::Tutor { my_students } => json!({ "myStudents": my_students }),
        Dashboard::Student { courses_enrolled } => {
            json!({ "coursesEnrolled": courses_enrolled })
        }
    };

    Ok(ApiSuccess::new(
        StatusCode::OK,
        DashboardResponseData {
            role: caller.claims.role,
            dashboard: counts,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardResponseData {
    pub role: Role,
    pub dashboard: serde_json::Value,
}
