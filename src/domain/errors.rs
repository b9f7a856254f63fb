/// 書籍解決のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// トークンに一致する書籍がない
    NotFound,
    /// 複数の書籍が一致した（件数と先頭数件のタイトル）
    Ambiguous { count: usize, preview: Vec<String> },
}

/// 貸出のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowBookError {
    /// 既に貸出中
    AlreadyBorrowed,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnBookError {
    /// 貸出されていない（館内にある）
    NotBorrowed,
}

/// 貸出記録を閉じる際のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseRecordError {
    /// return_dateは一度しか設定できない
    AlreadyClosed,
}

/// 書籍属性のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    /// 必須項目が空
    Blank(&'static str),
    /// 最大文字数を超えた
    TooLong { field: &'static str, max: usize },
    /// 価格の桁数が不正（全体10桁・小数2桁まで）
    InvalidPrice,
}

impl std::fmt::Display for BookValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookValidationError::Blank(field) => write!(f, "{} must not be blank", field),
            BookValidationError::TooLong { field, max } => {
                write!(f, "{} must be at most {} characters", field, max)
            }
            BookValidationError::InvalidPrice => write!(
                f,
                "price must have at most 10 digits with 2 decimal places"
            ),
        }
    }
}
