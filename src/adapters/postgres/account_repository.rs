use crate::domain::UserId;
use crate::ports::WriteOutcome;
use crate::ports::account_repository::{
    Account, AccountRepository as AccountRepositoryTrait, NewAccount, Result,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::rows::is_unique_violation;

/// PostgreSQL implementation of AccountRepository
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    /// Create a new AccountRepository with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row_to_account(row: &PgRow) -> sqlx::Result<Account> {
        Ok(Account {
            user_id: UserId::from_uuid(row.try_get("user_id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn insert(&self, account: NewAccount) -> Result<WriteOutcome<Account>> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (user_id, username, email, password_hash, is_admin, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING user_id, username, email, password_hash, is_admin, created_at
            "#,
        )
        .bind(UserId::new().value())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.is_admin)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(WriteOutcome::Applied(Self::map_row_to_account(&row)?)),
            Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::map_row_to_account).transpose()?)
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::map_row_to_account).transpose()?)
    }
}
