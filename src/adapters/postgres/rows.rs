use crate::domain::{Book, BookId, BorrowRecord, BorrowRecordId, UserId};
use sqlx::{Row, postgres::PgRow};

/// Map a `books` row (id, title, author, isbn, publish_date, price, is_borrowed) to Book
pub(super) fn map_row_to_book(row: &PgRow) -> sqlx::Result<Book> {
    Ok(Book {
        id: BookId::new(row.try_get("id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        isbn: row.try_get("isbn")?,
        publish_date: row.try_get("publish_date")?,
        price: row.try_get("price")?,
        is_borrowed: row.try_get("is_borrowed")?,
    })
}

/// Map a `borrow_records` row to BorrowRecord
pub(super) fn map_row_to_borrow_record(row: &PgRow) -> sqlx::Result<BorrowRecord> {
    Ok(BorrowRecord {
        id: BorrowRecordId::new(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        book_id: BookId::new(row.try_get("book_id")?),
        borrow_date: row.try_get("borrow_date")?,
        return_date: row.try_get("return_date")?,
    })
}

/// True when the error is a unique constraint violation (SQLSTATE 23505)
pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Build a substring pattern for ILIKE, escaping `%`, `_` and `\`
pub(super) fn contains_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
