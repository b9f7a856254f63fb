use chrono::{DateTime, Utc};

use super::{Book, BookBorrowed, BookReturned, BorrowBookError, ReturnBookError, UserId};

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出可能（is_borrowed == false）な書籍のみ
/// - 貸出中の書籍はAlreadyBorrowed（状態変更なし）
///
/// 副作用なし。新しいBookとイベントを返す。
/// 貸出記録の作成はイベントを確定するLendingStoreが行う。
pub fn borrow_book(
    book: &Book,
    user_id: UserId,
    borrowed_at: DateTime<Utc>,
) -> Result<(Book, BookBorrowed), BorrowBookError> {
    // バリデーション：貸出中は不可
    if book.is_borrowed {
        return Err(BorrowBookError::AlreadyBorrowed);
    }

    let new_book = Book {
        is_borrowed: true,
        ..book.clone()
    };

    let event = BookBorrowed {
        book_id: book.id,
        user_id,
        borrowed_at,
    };

    Ok((new_book, event))
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 貸出中（is_borrowed == true）の書籍のみ
/// - 館内にある書籍はNotBorrowed（状態変更なし）
/// - 返却者が借りた本人かどうかは検証しない
///
/// 副作用なし。新しいBookとイベントを返す。
pub fn return_book(
    book: &Book,
    returned_by: UserId,
    returned_at: DateTime<Utc>,
) -> Result<(Book, BookReturned), ReturnBookError> {
    // バリデーション：貸出されていない書籍は返却不可
    if !book.is_borrowed {
        return Err(ReturnBookError::NotBorrowed);
    }

    let new_book = Book {
        is_borrowed: false,
        ..book.clone()
    };

    let event = BookReturned {
        book_id: book.id,
        returned_by,
        returned_at,
    };

    Ok((new_book, event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookDetails, BookId};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn available_book() -> Book {
        Book::from_details(
            BookId::new(1),
            BookDetails {
                title: "The Hobbit".to_string(),
                author: "J. R. R. Tolkien".to_string(),
                isbn: "9780261102217".to_string(),
                publish_date: NaiveDate::from_ymd_opt(1937, 9, 21).unwrap(),
                price: Decimal::new(899, 2),
            },
        )
    }

    // TDD: borrow_book() のテスト
    #[test]
    fn test_borrow_book_marks_book_borrowed() {
        let book = available_book();
        let user_id = UserId::new();
        let borrowed_at = Utc::now();

        let (new_book, event) = borrow_book(&book, user_id, borrowed_at).unwrap();

        assert!(new_book.is_borrowed);
        assert_eq!(new_book.id, book.id);
        assert_eq!(new_book.title, book.title);

        // イベントの検証
        assert_eq!(event.book_id, book.id);
        assert_eq!(event.user_id, user_id);
        assert_eq!(event.borrowed_at, borrowed_at);
    }

    #[test]
    fn test_borrow_book_fails_when_already_borrowed() {
        let (borrowed, _) = borrow_book(&available_book(), UserId::new(), Utc::now()).unwrap();

        let result = borrow_book(&borrowed, UserId::new(), Utc::now());
        assert_eq!(result.unwrap_err(), BorrowBookError::AlreadyBorrowed);
    }

    // TDD: return_book() のテスト
    #[test]
    fn test_return_book_marks_book_available() {
        let (borrowed, _) = borrow_book(&available_book(), UserId::new(), Utc::now()).unwrap();
        let returner = UserId::new();
        let returned_at = Utc::now();

        let (new_book, event) = return_book(&borrowed, returner, returned_at).unwrap();

        assert!(!new_book.is_borrowed);
        assert_eq!(event.book_id, borrowed.id);
        assert_eq!(event.returned_by, returner);
        assert_eq!(event.returned_at, returned_at);
    }

    #[test]
    fn test_return_book_fails_when_not_borrowed() {
        let result = return_book(&available_book(), UserId::new(), Utc::now());
        assert_eq!(result.unwrap_err(), ReturnBookError::NotBorrowed);
    }

    #[test]
    fn test_return_book_by_other_user_is_accepted() {
        let borrower = UserId::new();
        let (borrowed, _) = borrow_book(&available_book(), borrower, Utc::now()).unwrap();

        // 借りた本人以外の返却も受け付ける
        let result = return_book(&borrowed, UserId::new(), Utc::now());
        assert!(result.is_ok());
    }
}
