use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::application::ServiceDependencies;
use crate::domain::{Caller, UserId};
use crate::ports::{Account, NewAccount, WriteOutcome};

use super::errors::{AccountError, Result};

const USERNAME_MAX_CHARS: usize = 150;
const PASSWORD_MIN_CHARS: usize = 8;

/// 登録リクエスト
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// ユーザー名の検証
///
/// 1〜150文字、英数字と `@.+-_` のみ。
fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() || username.chars().count() > USERNAME_MAX_CHARS {
        return Err(AccountError::InvalidUsername(format!(
            "must be 1 to {} characters",
            USERNAME_MAX_CHARS
        )));
    }

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(AccountError::InvalidUsername(
            "may contain only letters, digits and @/./+/-/_".to_string(),
        ));
    }

    Ok(())
}

/// パスワードの検証
fn validate_password(username: &str, password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(AccountError::WeakPassword(format!(
            "must contain at least {} characters",
            PASSWORD_MIN_CHARS
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AccountError::WeakPassword(
            "must not be entirely numeric".to_string(),
        ));
    }
    if password.eq_ignore_ascii_case(username) {
        return Err(AccountError::WeakPassword(
            "must not be the same as the username".to_string(),
        ));
    }
    Ok(())
}

/// Argon2でパスワードをハッシュ化する
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AccountError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

fn verify_password(account: &Account, password: &str) -> Result<bool> {
    let parsed = PasswordHash::new(&account.password_hash)
        .map_err(|e| AccountError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

async fn insert_account(deps: &ServiceDependencies, account: NewAccount) -> Result<Account> {
    let username = account.username.clone();

    match deps
        .accounts
        .insert(account)
        .await
        .map_err(AccountError::RepositoryError)?
    {
        WriteOutcome::Applied(account) => Ok(account),
        WriteOutcome::Conflict | WriteOutcome::Missing => {
            Err(AccountError::UsernameTaken(username))
        }
    }
}

/// 利用者を登録する（一般利用者）
pub async fn register(deps: &ServiceDependencies, req: RegisterAccount) -> Result<Account> {
    validate_username(&req.username)?;
    validate_password(&req.username, &req.password)?;

    let account = insert_account(
        deps,
        NewAccount {
            password_hash: hash_password(&req.password)?,
            username: req.username,
            email: req.email.filter(|e| !e.trim().is_empty()),
            is_admin: false,
        },
    )
    .await?;

    tracing::info!(user = %account.username, "account registered");
    Ok(account)
}

/// ユーザー名とパスワードで認証する
pub async fn authenticate(
    deps: &ServiceDependencies,
    username: &str,
    password: &str,
) -> Result<Account> {
    let account = deps
        .accounts
        .find_by_username(username)
        .await
        .map_err(AccountError::RepositoryError)?
        .ok_or(AccountError::InvalidCredentials)?;

    if !verify_password(&account, password)? {
        tracing::warn!(user = %username, "password verification failed");
        return Err(AccountError::InvalidCredentials);
    }

    Ok(account)
}

/// 管理者アカウントが存在しなければ作成する（起動時）
///
/// 既存のアカウントは変更しない。
pub async fn ensure_admin(
    deps: &ServiceDependencies,
    username: &str,
    password: &str,
) -> Result<Account> {
    if let Some(existing) = deps
        .accounts
        .find_by_username(username)
        .await
        .map_err(AccountError::RepositoryError)?
    {
        if !existing.is_admin {
            tracing::warn!(user = %username, "bootstrap admin exists without admin rights");
        }
        return Ok(existing);
    }

    validate_username(username)?;

    let account = insert_account(
        deps,
        NewAccount {
            username: username.to_string(),
            email: None,
            password_hash: hash_password(password)?,
            is_admin: true,
        },
    )
    .await?;

    tracing::info!(user = %account.username, "admin account created");
    Ok(account)
}

/// 認証済みトークンの利用者IDから呼び出し元を復元する
///
/// アカウントが削除されている場合はNone。
pub async fn load_caller(deps: &ServiceDependencies, user_id: UserId) -> Result<Option<Caller>> {
    let account = deps
        .accounts
        .get_by_id(user_id)
        .await
        .map_err(AccountError::RepositoryError)?;

    Ok(account.map(|a| Caller {
        user_id: a.user_id,
        username: a.username,
        is_admin: a.is_admin,
    }))
}
