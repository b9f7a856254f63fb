use crate::domain::{BookValidationError, ResolveError};
use thiserror::Error;

/// 蔵書・貸出アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LibraryError {
    /// トークンに一致する書籍がない
    #[error("No book matches '{token}'")]
    NotFound { token: String },

    /// 複数の書籍が一致した
    #[error(
        "{count} books match '{token}' (e.g. {}); use a more specific title or the book id",
        .preview.join(", ")
    )]
    Ambiguous {
        token: String,
        count: usize,
        preview: Vec<String>,
    },

    /// 既に貸出中
    #[error("'{title}' is already borrowed")]
    AlreadyBorrowed { title: String },

    /// 貸出されていない
    #[error("'{title}' is not borrowed")]
    NotBorrowed { title: String },

    /// 管理者権限が必要
    #[error("Administrator privileges required")]
    Forbidden,

    /// ISBNの重複
    #[error("A book with ISBN {isbn} already exists")]
    DuplicateIsbn { isbn: String },

    /// 書籍属性のバリデーションエラー
    #[error("Invalid book: {0}")]
    InvalidBook(BookValidationError),

    /// 再試行しても書籍の状態が競合した
    #[error("Book state changed concurrently, please retry")]
    Conflict,

    /// BookRepositoryのエラー
    #[error("Book repository error")]
    BookRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BorrowRecordRepositoryのエラー
    #[error("Borrow record repository error")]
    BorrowRecordRepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LendingStoreのエラー
    #[error("Lending store error")]
    LendingStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LibraryError {
    /// 解決エラーにトークンを添えて変換する
    pub fn from_resolve(token: &str, err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound => LibraryError::NotFound {
                token: token.to_string(),
            },
            ResolveError::Ambiguous { count, preview } => LibraryError::Ambiguous {
                token: token.to_string(),
                count,
                preview,
            },
        }
    }

    /// 表示層がステータスコードへ対応付けるための種別
    pub fn kind(&self) -> ErrorKind {
        match self {
            LibraryError::NotFound { .. } => ErrorKind::NotFound,
            LibraryError::Ambiguous { .. } => ErrorKind::Ambiguous,
            LibraryError::AlreadyBorrowed { .. } => ErrorKind::AlreadyBorrowed,
            LibraryError::NotBorrowed { .. } => ErrorKind::NotBorrowed,
            LibraryError::Forbidden => ErrorKind::Forbidden,
            LibraryError::DuplicateIsbn { .. } => ErrorKind::DuplicateIsbn,
            LibraryError::InvalidBook(_) => ErrorKind::InvalidBook,
            LibraryError::Conflict => ErrorKind::Conflict,
            LibraryError::BookRepositoryError(_)
            | LibraryError::BorrowRecordRepositoryError(_)
            | LibraryError::LendingStoreError(_) => ErrorKind::StoreFailure,
        }
    }
}

/// 結果の種別タグ
///
/// Inconsistentはエラーではなく返却成功時の警告として使われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Ambiguous,
    AlreadyBorrowed,
    NotBorrowed,
    Inconsistent,
    Forbidden,
    DuplicateIsbn,
    InvalidBook,
    Conflict,
    StoreFailure,
}

impl ErrorKind {
    /// 安定した文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Ambiguous => "AMBIGUOUS",
            ErrorKind::AlreadyBorrowed => "ALREADY_BORROWED",
            ErrorKind::NotBorrowed => "NOT_BORROWED",
            ErrorKind::Inconsistent => "INCONSISTENT",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::DuplicateIsbn => "DUPLICATE_ISBN",
            ErrorKind::InvalidBook => "INVALID_BOOK",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::StoreFailure => "STORE_FAILURE",
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LibraryError>;
