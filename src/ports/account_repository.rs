use crate::domain::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::WriteOutcome;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 利用者アカウント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user_id: UserId,
    pub username: String,
    pub email: Option<String>,
    /// Argon2のPHC文字列
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// 登録するアカウント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub is_admin: bool,
}

/// アカウントリポジトリポート
///
/// 認証と権限判定に必要な利用者情報を提供する。
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// アカウントを登録する
    ///
    /// ユーザー名が重複する場合はConflict。
    async fn insert(&self, account: NewAccount) -> Result<WriteOutcome<Account>>;

    /// ユーザー名でアカウントを取得する
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// IDでアカウントを取得する
    async fn get_by_id(&self, user_id: UserId) -> Result<Option<Account>>;
}
