use crate::domain::{Book, BookDetails, BookId};
use async_trait::async_trait;

use super::WriteOutcome;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍リポジトリポート
///
/// 蔵書の参照と管理者による登録・更新・削除を抽象化する。
/// is_borrowedの変更はLendingStoreのみが行う。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// IDで書籍を取得する
    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>>;

    /// タイトルの部分一致（大文字小文字を区別しない）で検索する
    ///
    /// ID昇順で返す。
    async fn find_by_title_contains(&self, text: &str) -> Result<Vec<Book>>;

    /// 全書籍をID昇順で取得する
    async fn list_all(&self) -> Result<Vec<Book>>;

    /// 書籍を登録する
    ///
    /// ISBNが重複する場合はConflict。
    async fn insert(&self, details: BookDetails) -> Result<WriteOutcome<Book>>;

    /// 書籍の属性を更新する（is_borrowedは変更しない）
    ///
    /// ISBNが重複する場合はConflict、書籍がなければMissing。
    async fn update(&self, id: BookId, details: BookDetails) -> Result<WriteOutcome<Book>>;

    /// 書籍を削除する
    ///
    /// 削除した場合はtrue。
    async fn delete(&self, id: BookId) -> Result<bool>;
}
