use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::library::{BorrowReceipt, ErrorKind, ReturnReceipt};
use crate::domain::{Book, BookDetails, BookPatch};
use crate::ports::{Account, BorrowHistoryEntry};

/// 書籍一覧取得のクエリパラメータ
#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    /// 書籍IDまたはタイトルの一部
    pub q: Option<String>,
}

/// 書籍の登録・全体更新リクエスト（POST /api/books, PUT /api/books/:token）
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publish_date: NaiveDate,
    pub price: Decimal,
}

impl BookRequest {
    pub fn into_details(self) -> BookDetails {
        BookDetails {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publish_date: self.publish_date,
            price: self.price,
        }
    }
}

/// 書籍の部分更新リクエスト（PATCH /api/books/:token）
///
/// is_borrowedは受け付けない（貸出・返却でのみ変わる）。
#[derive(Debug, Default, Deserialize)]
pub struct BookPatchRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub price: Option<Decimal>,
}

impl BookPatchRequest {
    pub fn into_patch(self) -> BookPatch {
        BookPatch {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            publish_date: self.publish_date,
            price: self.price,
        }
    }
}

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publish_date: NaiveDate,
    pub price: Decimal,
    pub is_borrowed: bool,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.value(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            publish_date: book.publish_date,
            price: book.price,
            is_borrowed: book.is_borrowed,
        }
    }
}

/// 貸出レスポンス（POST /api/books/:token/borrow）
#[derive(Debug, Serialize, Deserialize)]
pub struct BorrowResponse {
    pub message: String,
    pub book: BookResponse,
    pub record_id: i64,
    pub borrow_date: DateTime<Utc>,
}

impl From<BorrowReceipt> for BorrowResponse {
    fn from(receipt: BorrowReceipt) -> Self {
        Self {
            message: format!("You borrowed '{}'", receipt.book.title),
            record_id: receipt.record.id.value(),
            borrow_date: receipt.record.borrow_date,
            book: receipt.book.into(),
        }
    }
}

/// 返却レスポンス（POST /api/books/:token/return）
///
/// 未返却の記録が見つからなかった場合もHTTPとしては成功で、
/// warningに "INCONSISTENT" が入る。
#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnResponse {
    pub message: String,
    pub book: BookResponse,
    pub record_id: Option<i64>,
    pub return_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<ReturnReceipt> for ReturnResponse {
    fn from(receipt: ReturnReceipt) -> Self {
        let warning = receipt
            .is_inconsistent()
            .then(|| ErrorKind::Inconsistent.as_str().to_string());

        Self {
            message: format!("You returned '{}'", receipt.book.title),
            record_id: receipt.closed_record.as_ref().map(|r| r.id.value()),
            return_date: receipt.closed_record.as_ref().and_then(|r| r.return_date),
            book: receipt.book.into(),
            warning,
        }
    }
}

/// 貸出履歴の1行（GET /api/history）
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntryResponse {
    pub record_id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

impl From<BorrowHistoryEntry> for HistoryEntryResponse {
    fn from(entry: BorrowHistoryEntry) -> Self {
        Self {
            record_id: entry.record.id.value(),
            book_id: entry.record.book_id.value(),
            book_title: entry.book_title,
            borrow_date: entry.record.borrow_date,
            return_date: entry.record.return_date,
        }
    }
}

/// 利用者登録リクエスト（POST /api/register）
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

/// アカウントレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.user_id.value(),
            username: account.username,
            email: account.email,
            is_admin: account.is_admin,
        }
    }
}

/// トークン取得リクエスト（POST /api/token）
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// トークン更新リクエスト（POST /api/token/refresh）
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}

/// エラーレスポンス
///
/// errorは安定した種別タグ、messageは人が読むための説明。
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Ambiguousの場合の一致件数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates: Option<usize>,
    /// Ambiguousの場合のタイトルの例（最大3件）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Vec<String>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            candidates: None,
            preview: None,
        }
    }

    pub fn with_candidates(mut self, count: usize, preview: Vec<String>) -> Self {
        self.candidates = Some(count);
        self.preview = Some(preview);
        self
    }
}
