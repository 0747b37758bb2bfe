use async_trait::async_trait;
use auth::Role;
use auth::SessionClaims;

use crate::account::errors::AuthError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::Dashboard;
use crate::account::models::EmailAddress;
use crate::account::models::ImportRow;
use crate::account::models::LoginOutcome;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Run the login state machine for one credential pair.
    ///
    /// Lookup, password verification, reset gate, token issuance — in that
    /// order, within a single call.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password
    ///   (indistinguishable to the caller)
    /// * `ResetRequired` - Credentials valid but a reset is pending
    /// * `StoreFailure` - Store operation failed
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError>;

    /// Pre-auth recovery: set a new password and clear the reset flag.
    ///
    /// Deliberately requires no proof of identity beyond the account
    /// existing at this email; the platform is closed-enrollment and this
    /// operation exists to unblock first logins.
    ///
    /// # Errors
    /// * `StoreFailure` - Account missing at this email, or store failed
    async fn reset_password(&self, email: &EmailAddress, new_password: &str)
        -> Result<(), AuthError>;

    /// Provision one account per import row, concurrently.
    ///
    /// Each row gets a fresh hash and `must_reset_password = true`; the
    /// email is the idempotency key and an existing account is left
    /// untouched. Any row failure fails the whole batch report, even
    /// though other rows' writes already committed.
    ///
    /// # Returns
    /// Number of rows in the batch, on full success
    async fn import_accounts(&self, rows: Vec<ImportRow>) -> Result<usize, AuthError>;

    /// Role-specific aggregate counts for the caller's dashboard.
    async fn dashboard(&self, claims: &SessionClaims) -> Result<Dashboard, AuthError>;
}

/// Persistence operations for the account aggregate (the Credential Store).
///
/// The store guarantees per-row atomicity and the unique-email constraint;
/// this core assumes nothing further, in particular no multi-row
/// transactions.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Retrieve account by email.
    ///
    /// # Errors
    /// * `StoreFailure` - Store operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    /// Retrieve account by identifier.
    ///
    /// # Errors
    /// * `StoreFailure` - Store operation failed
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AuthError>;

    /// Persist a new account.
    ///
    /// # Errors
    /// * `StoreFailure` - Unique-email violation or store failure
    async fn create(&self, account: Account) -> Result<Account, AuthError>;

    /// Atomically increment `login_attempts` for the account at this email.
    ///
    /// # Errors
    /// * `StoreFailure` - Store operation failed
    async fn record_failed_attempt(&self, email: &str) -> Result<(), AuthError>;

    /// Replace the password hash and clear `must_reset_password`.
    ///
    /// # Errors
    /// * `AccountNotFound` - No account at this email
    /// * `StoreFailure` - Store operation failed
    async fn update_password(&self, email: &str, password_hash: &str) -> Result<(), AuthError>;

    /// Insert a provisioned account; no-op if the email already exists.
    ///
    /// Re-importing an email must not overwrite its stored password.
    ///
    /// # Errors
    /// * `StoreFailure` - Store operation failed
    async fn upsert_provisioned(&self, account: Account) -> Result<(), AuthError>;

    /// Count accounts holding a role.
    ///
    /// # Errors
    /// * `StoreFailure` - Store operation failed
    async fn count_by_role(&self, role: Role) -> Result<i64, AuthError>;

    /// Count student accounts assigned to a tutor.
    ///
    /// # Errors
    /// * `StoreFailure` - Store operation failed
    async fn count_students_of_tutor(&self, tutor_id: &AccountId) -> Result<i64, AuthError>;
}

/// Read-side of the Course/Enrollment Store this core needs.
#[async_trait]
pub trait EnrollmentStore: Send + Sync + 'static {
    /// Count course enrollments for a student.
    ///
    /// # Errors
    /// * `StoreFailure` - Store operation failed
    async fn count_courses_for_student(&self, student_id: &AccountId) -> Result<i64, AuthError>;
}
