use async_trait::async_trait;
use auth::Role;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;

use crate::account::errors::AuthError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::ports::AccountRepository;

/// Credential store backed by Postgres.
///
/// The `accounts_email_key` unique constraint is the only lock this core
/// relies on: it prevents duplicate-email creation races at the storage
/// layer.
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_ACCOUNT: &str = "SELECT id, email, password_hash, role, must_reset_password, \
     login_attempts, tutor_id, created_at FROM accounts";

fn map_account(row: PgRow) -> Result<Account, AuthError> {
    let role: String = row
        .try_get("role")
        .map_err(|e| AuthError::StoreFailure(e.to_string()))?;
    let role: Role = role
        .parse()
        .map_err(|e: auth::RoleParseError| AuthError::StoreFailure(e.to_string()))?;

    let email: String = row
        .try_get("email")
        .map_err(|e| AuthError::StoreFailure(e.to_string()))?;
    let email =
        EmailAddress::new(email).map_err(|e| AuthError::StoreFailure(e.to_string()))?;

    Ok(Account {
        id: AccountId(
            row.try_get("id")
                .map_err(|e| AuthError::StoreFailure(e.to_string()))?,
        ),
        email,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| AuthError::StoreFailure(e.to_string()))?,
        role,
        must_reset_password: row
            .try_get("must_reset_password")
            .map_err(|e| AuthError::StoreFailure(e.to_string()))?,
        login_attempts: row
            .try_get("login_attempts")
            .map_err(|e| AuthError::StoreFailure(e.to_string()))?,
        tutor_id: row
            .try_get::<Option<uuid::Uuid>, _>("tutor_id")
            .map_err(|e| AuthError::StoreFailure(e.to_string()))?
            .map(AccountId),
        created_at: row
            .try_get("created_at")
            .map_err(|e| AuthError::StoreFailure(e.to_string()))?,
    })
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query(&format!("{} WHERE email = $1", SELECT_ACCOUNT))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreFailure(e.to_string()))?;

        row.map(map_account).transpose()
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AuthError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_ACCOUNT))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::StoreFailure(e.to_string()))?;

        row.map(map_account).transpose()
    }

    async fn create(&self, account: Account) -> Result<Account, AuthError> {
        sqlx::query(
            "INSERT INTO accounts \
             (id, email, password_hash, role, must_reset_password, login_attempts, tutor_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.must_reset_password)
        .bind(account.login_attempts)
        .bind(account.tutor_id.map(|id| id.0))
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AuthError::StoreFailure(format!(
                        "Email already exists: {}",
                        account.email
                    ));
                }
            }
            AuthError::StoreFailure(e.to_string())
        })?;

        Ok(account)
    }

    async fn record_failed_attempt(&self, email: &str) -> Result<(), AuthError> {
        sqlx::query("UPDATE accounts SET login_attempts = login_attempts + 1 WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::StoreFailure(e.to_string()))?;

        Ok(())
    }

    async fn update_password(&self, email: &str, password_hash: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE accounts SET password_hash = $2, must_reset_password = FALSE \
             WHERE email = $1",
        )
        .bind(email)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreFailure(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::AccountNotFound(email.to_string()));
        }

        Ok(())
    }

    async fn upsert_provisioned(&self, account: Account) -> Result<(), AuthError> {
        // DO NOTHING on conflict: re-importing an email must not overwrite
        // the stored password.
        sqlx::query(
            "INSERT INTO accounts \
             (id, email, password_hash, role, must_reset_password, login_attempts, tutor_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(account.id.0)
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.must_reset_password)
        .bind(account.login_attempts)
        .bind(account.tutor_id.map(|id| id.0))
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::StoreFailure(e.to_string()))?;

        Ok(())
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, AuthError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::StoreFailure(e.to_string()))
    }

    async fn count_students_of_tutor(&self, tutor_id: &AccountId) -> Result<i64, AuthError> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM accounts WHERE role = 'STUDENT' AND tutor_id = $1",
        )
        .bind(tutor_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::StoreFailure(e.to_string()))
    }
}
