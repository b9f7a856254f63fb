use chrono::{DateTime, Utc};

use super::Caller;

/// コマンド：書籍を借りる
///
/// tokenは数値IDまたはタイトルの一部。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowBook {
    pub token: String,
    pub caller: Caller,
    pub borrowed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnBook {
    pub token: String,
    pub caller: Caller,
    pub returned_at: DateTime<Utc>,
}
