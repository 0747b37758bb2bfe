use std::sync::Arc;

use async_trait::async_trait;
use auth::Role;
use auth::SessionClaims;
use auth::TokenCodec;
use chrono::Utc;
use futures::stream;
use futures::StreamExt;
use futures::TryStreamExt;

use crate::account::errors::AuthError;
use crate::account::import::validate_row;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::Dashboard;
use crate::account::models::EmailAddress;
use crate::account::models::ImportRow;
use crate::account::models::LoginOutcome;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;
use crate::account::ports::EnrollmentStore;

/// Domain service for authentication and account provisioning.
///
/// Owns the login state machine (lookup, verify, reset gate, issue), the
/// pre-auth password reset, and the bulk import pipeline. Security-relevant
/// outcomes are emitted as structured audit events with stable codes:
/// `E001` login success, `E002` login failure, `E003` reset required,
/// `E004` password reset, `E005` bulk import completion.
pub struct AccountService<AR, ES>
where
    AR: AccountRepository,
    ES: EnrollmentStore,
{
    accounts: Arc<AR>,
    enrollments: Arc<ES>,
    token_codec: Arc<TokenCodec>,
    password_hasher: auth::PasswordHasher,
    import_concurrency: usize,
}

impl<AR, ES> AccountService<AR, ES>
where
    AR: AccountRepository,
    ES: EnrollmentStore,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `accounts` - Credential store implementation
    /// * `enrollments` - Course/enrollment store implementation
    /// * `token_codec` - Session token codec (secret injected at startup)
    /// * `import_concurrency` - Cap on concurrent import row operations
    pub fn new(
        accounts: Arc<AR>,
        enrollments: Arc<ES>,
        token_codec: Arc<TokenCodec>,
        import_concurrency: usize,
    ) -> Self {
        Self {
            accounts,
            enrollments,
            token_codec,
            password_hasher: auth::PasswordHasher::new(),
            import_concurrency: import_concurrency.max(1),
        }
    }

    /// One row's unit of work: validate, hash, then insert-if-absent.
    ///
    /// A malformed row fails here, inside its own unit, so its failure is
    /// subject to the same batch-level reporting as a store failure.
    async fn provision(&self, row: ImportRow) -> Result<(), AuthError> {
        let row = validate_row(row)?;
        let password_hash = self.password_hasher.hash(&row.password)?;

        self.accounts
            .upsert_provisioned(Account {
                id: AccountId::new(),
                email: row.email,
                password_hash,
                role: row.role,
                must_reset_password: true,
                login_attempts: 0,
                tutor_id: None,
                created_at: Utc::now(),
            })
            .await
    }
}

#[async_trait]
impl<AR, ES> AccountServicePort for AccountService<AR, ES>
where
    AR: AccountRepository,
    ES: EnrollmentStore,
{
    async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(account) = self.accounts.find_by_email(email).await? else {
            tracing::warn!(
                event = "E002",
                email = %email,
                reason = "unknown_email",
                "Login failure"
            );
            return Err(AuthError::InvalidCredentials);
        };

        if !self.password_hasher.verify(password, &account.password_hash) {
            self.accounts.record_failed_attempt(email).await?;
            tracing::warn!(
                event = "E002",
                email = %email,
                reason = "bad_password",
                "Login failure"
            );
            return Err(AuthError::InvalidCredentials);
        }

        if account.must_reset_password {
            tracing::info!(
                event = "E003",
                email = %email,
                "Login blocked pending password reset"
            );
            return Err(AuthError::ResetRequired);
        }

        let token = self
            .token_codec
            .issue(&account.id.to_string(), account.role)?;

        tracing::info!(
            event = "E001",
            email = %account.email,
            role = %account.role,
            "Login success"
        );

        Ok(LoginOutcome {
            token,
            role: account.role,
            account_id: account.id,
        })
    }

    async fn reset_password(
        &self,
        email: &EmailAddress,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let password_hash = self.password_hasher.hash(new_password)?;

        self.accounts
            .update_password(email.as_str(), &password_hash)
            .await?;

        tracing::info!(event = "E004", email = %email, "Password reset");

        Ok(())
    }

    async fn import_accounts(&self, rows: Vec<ImportRow>) -> Result<usize, AuthError> {
        let total = rows.len();

        // Fan out row work with a bounded cap, join before reporting. Rows
        // are independent units: any failure fails the batch report even
        // though other rows' writes already committed.
        let result = stream::iter(rows)
            .map(|row| self.provision(row))
            .buffer_unordered(self.import_concurrency)
            .try_collect::<Vec<()>>()
            .await;

        match result {
            Ok(_) => {
                tracing::info!(event = "E005", imported = total, "Bulk import completed");
                Ok(total)
            }
            Err(e) => {
                tracing::warn!(event = "E005", error = %e, "Bulk import failed");
                Err(e)
            }
        }
    }

    async fn dashboard(&self, claims: &SessionClaims) -> Result<Dashboard, AuthError> {
        match claims.role {
            Role::Admin => Ok(Dashboard::Admin {
                total_students: self.accounts.count_by_role(Role::Student).await?,
                total_tutors: self.accounts.count_by_role(Role::Tutor).await?,
            }),
            Role::Tutor => {
                let tutor_id = AccountId::from_string(&claims.sub)?;
                Ok(Dashboard::Tutor {
                    my_students: self.accounts.count_students_of_tutor(&tutor_id).await?,
                })
            }
            Role::Student => {
                let student_id = AccountId::from_string(&claims.sub)?;
                Ok(Dashboard::Student {
                    courses_enrolled: self
                        .enrollments
                        .count_courses_for_student(&student_id)
                        .await?,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use auth::PasswordHasher;
    use mockall::mock;
    use mockall::predicate::*;

    use super::*;
    use crate::account::errors::ImportError;

    mock! {
        pub TestAccountRepository {}

        #[async_trait]
        impl AccountRepository for TestAccountRepository {
            async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;
            async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AuthError>;
            async fn create(&self, account: Account) -> Result<Account, AuthError>;
            async fn record_failed_attempt(&self, email: &str) -> Result<(), AuthError>;
            async fn update_password(&self, email: &str, password_hash: &str) -> Result<(), AuthError>;
            async fn upsert_provisioned(&self, account: Account) -> Result<(), AuthError>;
            async fn count_by_role(&self, role: Role) -> Result<i64, AuthError>;
            async fn count_students_of_tutor(&self, tutor_id: &AccountId) -> Result<i64, AuthError>;
        }
    }

    mock! {
        pub TestEnrollmentStore {}

        #[async_trait]
        impl EnrollmentStore for TestEnrollmentStore {
            async fn count_courses_for_student(&self, student_id: &AccountId) -> Result<i64, AuthError>;
        }
    }

    const SECRET: &[u8] = b"test-secret-key-for-jwt-signing-32b!";

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(SECRET, 24))
    }

    fn service(
        accounts: MockTestAccountRepository,
        enrollments: MockTestEnrollmentStore,
    ) -> AccountService<MockTestAccountRepository, MockTestEnrollmentStore> {
        AccountService::new(Arc::new(accounts), Arc::new(enrollments), codec(), 4)
    }

    fn account(email: &str, password: &str, role: Role, must_reset: bool) -> Account {
        Account {
            id: AccountId::new(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            role,
            must_reset_password: must_reset,
            login_attempts: 0,
            tutor_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_login_success_issues_decodable_token() {
        let mut accounts = MockTestAccountRepository::new();
        let stored = account("admin@lms.com", "admin123", Role::Admin, false);
        let expected_id = stored.id;

        accounts
            .expect_find_by_email()
            .with(eq("admin@lms.com"))
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        accounts.expect_record_failed_attempt().times(0);

        let service = service(accounts, MockTestEnrollmentStore::new());

        let outcome = service.login("admin@lms.com", "admin123").await.unwrap();

        assert_eq!(outcome.role, Role::Admin);
        assert_eq!(outcome.account_id, expected_id);

        let claims = codec().verify(&outcome.token).unwrap();
        assert_eq!(claims.sub, expected_id.to_string());
        assert_eq!(claims.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_login_unknown_email_no_counter_touch() {
        let mut accounts = MockTestAccountRepository::new();

        accounts
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        // Only existing accounts have a counter to increment.
        accounts.expect_record_failed_attempt().times(0);

        let service = service(accounts, MockTestEnrollmentStore::new());

        let result = service.login("ghost@lms.com", "whatever").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_wrong_password_increments_counter() {
        let mut accounts = MockTestAccountRepository::new();
        let stored = account("student@lms.com", "student123", Role::Student, false);

        accounts
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        accounts
            .expect_record_failed_attempt()
            .with(eq("student@lms.com"))
            .times(1)
            .returning(|_| Ok(()));

        let service = service(accounts, MockTestEnrollmentStore::new());

        let result = service.login("student@lms.com", "wrong").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_failure_paths_look_identical() {
        // Unknown email and wrong password must be the same error variant,
        // hence the same status and message at the boundary.
        let mut accounts = MockTestAccountRepository::new();
        let stored = account("known@lms.com", "right", Role::Student, false);

        accounts.expect_find_by_email().returning(move |email| {
            if email == "known@lms.com" {
                Ok(Some(stored.clone()))
            } else {
                Ok(None)
            }
        });
        accounts.expect_record_failed_attempt().returning(|_| Ok(()));

        let service = service(accounts, MockTestEnrollmentStore::new());

        let unknown = service.login("ghost@lms.com", "x").await.unwrap_err();
        let mismatch = service.login("known@lms.com", "x").await.unwrap_err();

        assert_eq!(unknown.to_string(), mismatch.to_string());
    }

    #[tokio::test]
    async fn test_login_reset_gate_blocks_token() {
        let mut accounts = MockTestAccountRepository::new();
        let stored = account("student@lms.com", "student123", Role::Student, true);

        accounts
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        // Correct password: the counter must stay untouched.
        accounts.expect_record_failed_attempt().times(0);

        let service = service(accounts, MockTestEnrollmentStore::new());

        let result = service.login("student@lms.com", "student123").await;
        assert!(matches!(result, Err(AuthError::ResetRequired)));
    }

    #[tokio::test]
    async fn test_reset_password_stores_fresh_hash() {
        let mut accounts = MockTestAccountRepository::new();

        accounts
            .expect_update_password()
            .withf(|email, hash| {
                email == "student@lms.com"
                    && PasswordHasher::new().verify("new-password-1", hash)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(accounts, MockTestEnrollmentStore::new());

        let email = EmailAddress::new("student@lms.com".to_string()).unwrap();
        service
            .reset_password(&email, "new-password-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_import_provisions_every_row_reset_required() {
        let mut accounts = MockTestAccountRepository::new();

        accounts
            .expect_upsert_provisioned()
            .withf(|account| {
                account.must_reset_password
                    && account.login_attempts == 0
                    && account.password_hash.starts_with("$argon2")
            })
            .times(3)
            .returning(|_| Ok(()));

        let service = service(accounts, MockTestEnrollmentStore::new());

        let rows = ["a@lms.com", "b@lms.com", "c@lms.com"]
            .into_iter()
            .enumerate()
            .map(|(i, email)| ImportRow {
                line: i + 2,
                email: email.to_string(),
                password: "pw123456".to_string(),
                role: "student".to_string(),
            })
            .collect();

        assert_eq!(service.import_accounts(rows).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_import_store_failure_fails_batch_report() {
        let mut accounts = MockTestAccountRepository::new();

        accounts.expect_upsert_provisioned().returning(|account| {
            if account.email.as_str() == "bad@lms.com" {
                Err(AuthError::StoreFailure("connection reset".to_string()))
            } else {
                Ok(())
            }
        });

        let service = service(accounts, MockTestEnrollmentStore::new());

        let rows = ["a@lms.com", "bad@lms.com", "c@lms.com"]
            .into_iter()
            .enumerate()
            .map(|(i, email)| ImportRow {
                line: i + 2,
                email: email.to_string(),
                password: "pw123456".to_string(),
                role: "tutor".to_string(),
            })
            .collect();

        let result = service.import_accounts(rows).await;
        assert!(matches!(result, Err(AuthError::StoreFailure(_))));
    }

    #[tokio::test]
    async fn test_import_malformed_row_fails_batch_report() {
        let mut accounts = MockTestAccountRepository::new();

        // The valid row's unit of work is free to commit.
        accounts.expect_upsert_provisioned().returning(|_| Ok(()));

        let service = service(accounts, MockTestEnrollmentStore::new());

        let rows = vec![
            ImportRow {
                line: 2,
                email: "good@lms.com".to_string(),
                password: "pw123456".to_string(),
                role: "student".to_string(),
            },
            ImportRow {
                line: 3,
                email: "bad@lms.com".to_string(),
                password: String::new(),
                role: "student".to_string(),
            },
        ];

        let result = service.import_accounts(rows).await;
        assert!(matches!(
            result,
            Err(AuthError::Import(ImportError::MissingField {
                line: 3,
                field: "password"
            }))
        ));
    }

    #[tokio::test]
    async fn test_import_empty_batch_reports_zero() {
        let mut accounts = MockTestAccountRepository::new();
        accounts.expect_upsert_provisioned().times(0);

        let service = service(accounts, MockTestEnrollmentStore::new());

        assert_eq!(service.import_accounts(Vec::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_dashboard_admin_counts() {
        let mut accounts = MockTestAccountRepository::new();

        accounts
            .expect_count_by_role()
            .with(eq(Role::Student))
            .times(1)
            .returning(|_| Ok(42));
        accounts
            .expect_count_by_role()
            .with(eq(Role::Tutor))
            .times(1)
            .returning(|_| Ok(7));

        let service = service(accounts, MockTestEnrollmentStore::new());

        let claims = SessionClaims {
            sub: AccountId::new().to_string(),
            role: Role::Admin,
            iat: 0,
            exp: i64::MAX,
        };

        assert_eq!(
            service.dashboard(&claims).await.unwrap(),
            Dashboard::Admin {
                total_students: 42,
                total_tutors: 7
            }
        );
    }

    #[tokio::test]
    async fn test_dashboard_student_counts_enrollments() {
        let student_id = AccountId::new();
        let mut enrollments = MockTestEnrollmentStore::new();

        enrollments
            .expect_count_courses_for_student()
            .withf(move |id| *id == student_id)
            .times(1)
            .returning(|_| Ok(3));

        let service = service(MockTestAccountRepository::new(), enrollments);

        let claims = SessionClaims {
            sub: student_id.to_string(),
            role: Role::Student,
            iat: 0,
            exp: i64::MAX,
        };

        assert_eq!(
            service.dashboard(&claims).await.unwrap(),
            Dashboard::Student {
                courses_enrolled: 3
            }
        );
    }
}
