use axum::extract::Multipart;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::import::parse_csv;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::EnrollmentStore;
use crate::inbound::http::router::AppState;

/// Bulk provisioning from an uploaded CSV (multipart field `file`).
///
/// Reaching this handler implies the token and role gates already passed.
/// Reports success only if every row's upsert succeeded; rows that did
/// succeed before a failing one stay committed regardless.
pub async fn import_csv<AR: AccountRepository, ES: EnrollmentStore>(
    State(state): State<AppState<AR, ES>>,
    mut multipart: Multipart,
) -> Result<ApiSuccess<ImportCsvResponseData>, ApiError> {
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
            file = Some(bytes);
            break;
        }
    }

    let Some(bytes) = file else {
        return Err(ApiError::BadRequest("CSV file required".to_string()));
    };

    let rows = parse_csv(&bytes).map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let imported = state.account_service.import_accounts(rows).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ImportCsvResponseData {
            message: "CSV import successful".to_string(),
            imported,
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportCsvResponseData {
    pub message: String,
    pub imported: usize,
}
