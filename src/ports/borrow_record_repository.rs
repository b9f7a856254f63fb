use crate::domain::{BookId, BorrowRecord, UserId};
use async_trait::async_trait;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出履歴の1行（書籍タイトル付き）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BorrowHistoryEntry {
    pub record: BorrowRecord,
    pub book_title: String,
}

/// 貸出記録リポジトリポート（参照専用）
///
/// 記録の作成と返却日の設定はLendingStoreがトランザクション内で行う。
#[async_trait]
pub trait BorrowRecordRepository: Send + Sync {
    /// 書籍の最新の未返却記録を取得する
    ///
    /// borrow_dateの降順で先頭の1件。
    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<BorrowRecord>>;

    /// 書籍の全記録をborrow_dateの降順で取得する
    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<BorrowRecord>>;

    /// 利用者の貸出履歴をborrow_dateの降順で取得する
    async fn find_history_for_user(&self, user_id: UserId) -> Result<Vec<BorrowHistoryEntry>>;
}
