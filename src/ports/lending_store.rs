use crate::domain::{BookBorrowed, BookReturned, BorrowRecord};
use async_trait::async_trait;

use super::WriteOutcome;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 返却の確定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnCommit {
    /// 閉じた貸出記録。未返却の記録がなかった場合はNone（データ不整合）
    pub closed_record: Option<BorrowRecord>,
}

/// 貸出ストアポート
///
/// 貸出・返却イベントを1つのトランザクションで確定する。
/// 書籍のis_borrowedはcompare-and-setで更新し、期待した状態と
/// 異なる場合はConflictを返す（何も書き込まない）。
#[async_trait]
pub trait LendingStore: Send + Sync {
    /// 貸出を確定する
    ///
    /// is_borrowed: false → true と貸出記録の作成をアトミックに行う。
    /// 書籍が貸出中ならConflict、存在しなければMissing。
    async fn commit_borrow(&self, event: &BookBorrowed) -> Result<WriteOutcome<BorrowRecord>>;

    /// 返却を確定する
    ///
    /// is_borrowed: true → false と、最新の未返却記録（borrow_date降順の先頭）の
    /// return_date設定をアトミックに行う。
    /// 書籍が貸出中でなければConflict、存在しなければMissing。
    async fn commit_return(&self, event: &BookReturned) -> Result<WriteOutcome<ReturnCommit>>;
}
