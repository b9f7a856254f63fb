use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, UserId};

/// イベント：書籍が貸し出された
///
/// LendingStoreはこのイベントを受け取り、書籍の状態更新と
/// 貸出記録の作成を1つのトランザクションで確定する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookBorrowed {
    pub book_id: BookId,
    pub user_id: UserId,
    pub borrowed_at: DateTime<Utc>,
}

/// イベント：書籍が返却された
///
/// returned_byは記録のみ。借りた本人かどうかは検証しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookReturned {
    pub book_id: BookId,
    pub returned_by: UserId,
    pub returned_at: DateTime<Utc>,
}
