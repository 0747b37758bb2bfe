use std::fmt;
use std::str::FromStr;

use auth::Role;
use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::account::errors::AccountIdError;
use crate::account::errors::EmailError;

/// Account aggregate entity.
///
/// One persisted identity record per platform member. Exactly one account
/// exists per email at any time; the store's unique constraint enforces it.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    /// While set, the account cannot obtain a session token: correct
    /// credentials yield a reset-required outcome instead.
    pub must_reset_password: bool,
    /// Incremented on every failed password comparison for an existing
    /// account. Write-only from this core's perspective; no lockout
    /// threshold is enforced.
    pub login_attempts: i32,
    /// Assigning tutor, for student accounts that have one.
    pub tutor_id: Option<AccountId>,
    pub created_at: DateTime<Utc>,
}

/// Account unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(pub Uuid);

impl AccountId {
    /// Generate a new random account ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an account ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, AccountIdError> {
        Uuid::parse_str(s)
            .map(AccountId)
            .map_err(|e| AccountIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser. Stored and
/// compared case-sensitively, as the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One line of an uploaded credential file, still unvalidated.
///
/// Transient: consumed to provision an account, never persisted as-is.
/// Fields are raw strings (empty means the column was missing); validation
/// happens inside the row's own unit of work so that a malformed row fails
/// that unit alone.
#[derive(Debug, Clone)]
pub struct ImportRow {
    /// 1-based line number in the uploaded file (line 1 is the header).
    pub line: usize,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub role: Role,
    pub account_id: AccountId,
}

/// Role-specific aggregate counts for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dashboard {
    Admin { total_students: i64, total_tutors: i64 },
    Tutor { my_students: i64 },
    Student { courses_enrolled: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_round_trip() {
        let id = AccountId::new();
        let parsed = AccountId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_account_id_invalid_format() {
        let result = AccountId::from_string("not-a-uuid");
        assert!(matches!(result, Err(AccountIdError::InvalidFormat(_))));
    }

    #[test]
    fn test_email_address_valid() {
        let email = EmailAddress::new("student@lms.com".to_string()).unwrap();
        assert_eq!(email.as_str(), "student@lms.com");
    }

    #[test]
    fn test_email_address_invalid() {
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
        assert!(EmailAddress::new("".to_string()).is_err());
    }
}
