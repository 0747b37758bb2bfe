use auth::Role;

use crate::account::errors::ImportError;
use crate::account::models::EmailAddress;
use crate::account::models::ImportRow;

/// A validated import row, ready to provision.
#[derive(Debug, Clone)]
pub struct ValidRow {
    pub email: EmailAddress,
    pub password: String,
    pub role: Role,
}

/// Split an uploaded credential file into raw rows.
///
/// Expects a header line naming `email`, `password`, and `role` columns.
/// Only CSV-level syntax errors fail here; field-level problems (missing
/// values, bad email, unknown role) surface from [`validate_row`] inside
/// the affected row's unit of work. An empty file yields an empty batch,
/// which the import reports as zero rows provisioned.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ImportError::Csv {
            line: 1,
            message: e.to_string(),
        })?
        .clone();

    let email_idx = column(&headers, "email");
    let password_idx = column(&headers, "password");
    let role_idx = column(&headers, "role");

    let mut rows = Vec::new();
    // Line 1 is the header; data rows start at 2.
    for (line, record) in reader.records().enumerate().map(|(i, r)| (i + 2, r)) {
        let record = record.map_err(|e| ImportError::Csv {
            line,
            message: e.to_string(),
        })?;

        rows.push(ImportRow {
            line,
            email: field(&record, email_idx),
            password: field(&record, password_idx),
            role: field(&record, role_idx),
        });
    }

    Ok(rows)
}

/// Validate one raw row.
///
/// Missing email, password, or role fails fast for this row; the role is
/// normalized to its canonical upper-case form.
pub fn validate_row(row: ImportRow) -> Result<ValidRow, ImportError> {
    let line = row.line;

    if row.email.is_empty() {
        return Err(ImportError::MissingField {
            line,
            field: "email",
        });
    }
    if row.password.is_empty() {
        return Err(ImportError::MissingField {
            line,
            field: "password",
        });
    }
    if row.role.is_empty() {
        return Err(ImportError::MissingField { line, field: "role" });
    }

    let email = EmailAddress::new(row.email).map_err(|e| ImportError::InvalidEmail {
        line,
        message: e.to_string(),
    })?;

    let role: Role = row.role.parse().map_err(|_| ImportError::InvalidRole {
        line,
        value: row.role,
    })?;

    Ok(ValidRow {
        email,
        password: row.password,
        role,
    })
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

fn field(record: &csv::StringRecord, index: Option<usize>) -> String {
    index
        .and_then(|i| record.get(i))
        .unwrap_or_default()
        .to_string()
}
