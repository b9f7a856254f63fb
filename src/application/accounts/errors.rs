use thiserror::Error;

/// アカウント管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum AccountError {
    /// ユーザー名の形式が不正
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    /// パスワードが要件を満たさない
    #[error("Password rejected: {0}")]
    WeakPassword(String),

    /// ユーザー名が既に使われている
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    /// ユーザー名またはパスワードが違う
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// パスワードハッシュの生成・解析に失敗
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    /// AccountRepositoryのエラー
    #[error("Account repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アカウント管理の Result型
pub type Result<T> = std::result::Result<T, AccountError>;
