//! User account standings
//!
//! The marketplace's user service owns accounts; this table mirrors the
//! standing the engine needs for its checks.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct AccountsRepository {
    pool: PgPool,
}

impl AccountsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn status(&self, user_id: Uuid) -> Result<Option<String>, DatabaseError> {
        Ok(sqlx::query_scalar::<_, String>("SELECT status FROM user_accounts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Creates or updates an account standing
    pub async fn upsert(&self, user_id: Uuid, status: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO user_accounts (user_id, status, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id) DO UPDATE SET status = EXCLUDED.status, updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
