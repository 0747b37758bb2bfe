use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use auth::PasswordHasher;
use auth::Role;
use auth::TokenCodec;
use chrono::Utc;
use lms_service::account::errors::AuthError;
use lms_service::account::models::Account;
use lms_service::account::models::AccountId;
use lms_service::account::models::EmailAddress;
use lms_service::account::ports::AccountRepository;
use lms_service::account::ports::EnrollmentStore;
use lms_service::account::service::AccountService;
use lms_service::inbound::http::router::create_router;
use tokio::sync::RwLock;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";

/// In-memory credential store, keyed by email like the real one.
///
/// Provides the same per-row atomicity and unique-email behavior the
/// Postgres adapter gets from its constraint.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountRepository {
    pub async fn get(&self, email: &str) -> Option<Account> {
        self.accounts.read().await.get(email).cloned()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AuthError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|account| account.id == *id)
            .cloned())
    }

    async fn create(&self, account: Account) -> Result<Account, AuthError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(account.email.as_str()) {
            return Err(AuthError::StoreFailure(format!(
                "Email already exists: {}",
                account.email
            )));
        }
        accounts.insert(account.email.as_str().to_string(), account.clone());
        Ok(account)
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<(), AuthError> {
        if let Some(account) = self.accounts.write().await.get_mut(email) {
            account.login_attempts += 1;
        }
        Ok(())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<(), AuthError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(email)
            .ok_or_else(|| AuthError::AccountNotFound(email.to_string()))?;
        account.password_hash = password_hash.to_string();
        account.must_reset_password = false;
        Ok(())
    }

    async fn upsert_provisioned(&self, account: Account) -> Result<(), AuthError> {
        let mut accounts = self.accounts.write().await;
        // Existing email: leave the stored account untouched.
        accounts
            .entry(account.email.as_str().to_string())
            .or_insert(account);
        Ok(())
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, AuthError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|account| account.role == role)
            .count() as i64)
    }

    async fn count_students_of_tutor(&self, tutor_id: &AccountId) -> Result<i64, AuthError> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .filter(|account| account.role == Role::Student && account.tutor_id == Some(*tutor_id))
            .count() as i64)
    }
}

/// In-memory enrollment counts, keyed by student id.
#[derive(Default)]
pub struct InMemoryEnrollmentStore {
    counts: RwLock<HashMap<AccountId, i64>>,
}

impl InMemoryEnrollmentStore {
    pub async fn set_count(&self, student_id: AccountId, count: i64) {
        self.counts.write().await.insert(student_id, count);
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn count_courses_for_student(&self, student_id: &AccountId) -> Result<i64, AuthError> {
        Ok(self
            .counts
            .read()
            .await
            .get(student_id)
            .copied()
            .unwrap_or(0))
    }
}

/// Test application that spawns a real server on a random port
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub enrollments: Arc<InMemoryEnrollmentStore>,
    pub token_codec: Arc<TokenCodec>,
}

impl TestApp {
    /// Spawn with the reference import policy (ADMIN + TUTOR).
    pub async fn spawn() -> Self {
        Self::spawn_with_import_policy(true).await
    }

    pub async fn spawn_with_import_policy(allow_tutor_import: bool) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let accounts = Arc::new(InMemoryAccountRepository::default());
        let enrollments = Arc::new(InMemoryEnrollmentStore::default());
        let token_codec = Arc::new(TokenCodec::new(TEST_SECRET, 24));

        let account_service = Arc::new(AccountService::new(
            Arc::clone(&accounts),
            Arc::clone(&enrollments),
            Arc::clone(&token_codec),
            4,
        ));

        let application = create_router(
            account_service,
            Arc::clone(&token_codec),
            allow_tutor_import,
        );

        tokio::spawn(async move {
            axum::serve(listener, application)
                .await
                .expect("Server failed");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            accounts,
            enrollments,
            token_codec,
        }
    }

    /// Insert an account directly into the store.
    pub async fn seed_account(
        &self,
        email: &str,
        password: &str,
        role: Role,
        must_reset_password: bool,
    ) -> AccountId {
        let account = Account {
            id: AccountId::new(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            role,
            must_reset_password,
            login_attempts: 0,
            tutor_id: None,
            created_at: Utc::now(),
        };
        self.accounts.create(account.clone()).await.unwrap();
        account.id
    }

    /// Log in through the API and return the issued token.
    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["token"].as_str().expect("Missing token").to_string()
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }
}

/// Build a multipart form with a CSV part named `file`.
pub fn csv_form(contents: &str) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(contents.as_bytes().to_vec())
            .file_name("accounts.csv")
            .mime_str("text/csv")
            .expect("Invalid mime type"),
    )
}
