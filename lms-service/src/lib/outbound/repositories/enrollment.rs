use async_trait::async_trait;
use sqlx::PgPool;

use crate::account::errors::AuthError;
use crate::account::models::AccountId;
use crate::account::ports::EnrollmentStore;

/// Course/enrollment store backed by Postgres.
///
/// Only the read this core needs; course content itself lives elsewhere.
pub struct PostgresEnrollmentStore {
    pool: PgPool,
}

impl PostgresEnrollmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn count_courses_for_student(&self, student_id: &AccountId) -> Result<i64, AuthError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE student_id = $1")
            .bind(student_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::StoreFailure(e.to_string()))
    }
}
