use crate::domain::UserId;
use crate::ports::WriteOutcome;
use crate::ports::account_repository::{
    Account, AccountRepository as AccountRepositoryTrait, NewAccount, Result,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// AccountRepositoryのインメモリ実装
///
/// ユーザー名の一意性はPostgreSQL実装と同じく大文字小文字を区別する。
pub struct Accounts {
    accounts: Mutex<HashMap<UserId, Account>>,
}

impl Accounts {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Accounts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepositoryTrait for Accounts {
    async fn insert(&self, account: NewAccount) -> Result<WriteOutcome<Account>> {
        let mut accounts = self.lock();

        if accounts.values().any(|a| a.username == account.username) {
            return Ok(WriteOutcome::Conflict);
        }

        let stored = Account {
            user_id: UserId::new(),
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            is_admin: account.is_admin,
            created_at: Utc::now(),
        };
        accounts.insert(stored.user_id, stored.clone());

        Ok(WriteOutcome::Applied(stored))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .lock()
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<Account>> {
        Ok(self.lock().get(&user_id).cloned())
    }
}
