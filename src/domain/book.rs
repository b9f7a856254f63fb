use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BookId, BookValidationError};

pub const TITLE_MAX_CHARS: usize = 200;
pub const AUTHOR_MAX_CHARS: usize = 100;
pub const ISBN_MAX_CHARS: usize = 20;

/// 価格の小数部の最大桁数
const PRICE_DECIMAL_PLACES: u32 = 2;
/// 価格の整数部の上限（全体10桁 - 小数2桁）
const PRICE_INTEGER_LIMIT: i64 = 100_000_000;

/// 書籍 - 貸出状態を持つ蔵書
///
/// is_borrowedは貸出ライフサイクルのみが変更する。
/// 管理者による更新（BookDetails）には含まれない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publish_date: NaiveDate,
    pub price: Decimal,
    pub is_borrowed: bool,
}

impl Book {
    /// 新規登録された書籍（貸出可能状態）
    pub fn from_details(id: BookId, details: BookDetails) -> Self {
        Self {
            id,
            title: details.title,
            author: details.author,
            isbn: details.isbn,
            publish_date: details.publish_date,
            price: details.price,
            is_borrowed: false,
        }
    }

    /// 管理者が編集できる属性のみを取り出す
    pub fn details(&self) -> BookDetails {
        BookDetails {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            publish_date: self.publish_date,
            price: self.price,
        }
    }

    /// 属性を差し替えた書籍を返す（貸出状態は維持）
    pub fn with_details(&self, details: BookDetails) -> Self {
        Self {
            id: self.id,
            is_borrowed: self.is_borrowed,
            ..Self::from_details(self.id, details)
        }
    }
}

/// 書籍の編集可能な属性（登録・全体更新）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publish_date: NaiveDate,
    pub price: Decimal,
}

impl BookDetails {
    /// 純粋関数：属性のバリデーション
    ///
    /// ビジネスルール：
    /// - title / author / isbn は空白のみ不可
    /// - title 200文字、author 100文字、isbn 20文字まで
    /// - 価格は全体10桁・小数2桁まで
    pub fn validate(&self) -> Result<(), BookValidationError> {
        check_text("title", &self.title, TITLE_MAX_CHARS)?;
        check_text("author", &self.author, AUTHOR_MAX_CHARS)?;
        check_text("isbn", &self.isbn, ISBN_MAX_CHARS)?;
        check_price(self.price)
    }
}

/// 書籍の部分更新
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub price: Option<Decimal>,
}

impl BookPatch {
    /// 現在の属性に差分を適用する
    pub fn apply_to(self, current: BookDetails) -> BookDetails {
        BookDetails {
            title: self.title.unwrap_or(current.title),
            author: self.author.unwrap_or(current.author),
            isbn: self.isbn.unwrap_or(current.isbn),
            publish_date: self.publish_date.unwrap_or(current.publish_date),
            price: self.price.unwrap_or(current.price),
        }
    }
}

fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), BookValidationError> {
    if value.trim().is_empty() {
        return Err(BookValidationError::Blank(field));
    }
    if value.chars().count() > max {
        return Err(BookValidationError::TooLong { field, max });
    }
    Ok(())
}

fn check_price(price: Decimal) -> Result<(), BookValidationError> {
    let normalized = price.normalize();
    if normalized.scale() > PRICE_DECIMAL_PLACES {
        return Err(BookValidationError::InvalidPrice);
    }
    if normalized.trunc().abs() >= Decimal::from(PRICE_INTEGER_LIMIT) {
        return Err(BookValidationError::InvalidPrice);
    }
    Ok(())
}
