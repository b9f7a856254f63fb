use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 書籍ID - ストアが採番する数値ID
///
/// 検索トークンが数字のみの場合はこのIDとして解釈される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BookId(i64);

impl BookId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 貸出記録ID - ストアが採番する数値ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BorrowRecordId(i64);

impl BorrowRecordId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 利用者ID - アカウント管理への参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 呼び出し元の認証済みアイデンティティ
///
/// 権限判定はリクエストの暗黙の文脈ではなく、この値を
/// アプリケーション層の関数へ明示的に渡して行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub username: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn member(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_admin: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_creation() {
        let id1 = UserId::new();
        let id2 = UserId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_user_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(id.value(), uuid);
    }

    #[test]
    fn test_book_id_display() {
        assert_eq!(BookId::new(42).to_string(), "42");
    }

    #[test]
    fn test_caller_roles() {
        let member = Caller::member(UserId::new(), "alice");
        let admin = Caller::admin(UserId::new(), "root");
        assert!(!member.is_admin);
        assert!(admin.is_admin);
        assert_eq!(member.username, "alice");
    }
}
