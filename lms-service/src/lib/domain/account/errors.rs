use auth::PasswordError;
use auth::TokenError;
use thiserror::Error;

/// Error for AccountId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccountIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for the bulk import pipeline.
///
/// Row-level variants carry the 1-based line number of the offending row.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("CSV parse error at line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("Missing {field} at line {line}")]
    MissingField { line: usize, field: &'static str },

    #[error("Invalid email at line {line}: {message}")]
    InvalidEmail { line: usize, message: String },

    #[error("Invalid role '{value}' at line {line}")]
    InvalidRole { line: usize, value: String },
}

/// Top-level error for all account and authentication operations
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately carries no detail:
    /// callers must not learn which of the two it was.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Credentials were valid but a password reset is pending; no token
    /// was issued.
    #[error("Password reset required on first login")]
    ResetRequired,

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid account ID: {0}")]
    InvalidAccountId(#[from] AccountIdError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    // Infrastructure errors
    #[error("Store error: {0}")]
    StoreFailure(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::StoreFailure(err.to_string())
    }
}
