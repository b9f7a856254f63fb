use crate::domain::{BookId, BorrowRecord, UserId};
use crate::ports::borrow_record_repository::{
    BorrowHistoryEntry, BorrowRecordRepository as BorrowRecordRepositoryTrait, Result,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::rows::map_row_to_borrow_record;

/// PostgreSQL implementation of BorrowRecordRepository
///
/// Read-only. Records are written by the lending store inside its transactions.
pub struct BorrowRecordRepository {
    pool: PgPool,
}

impl BorrowRecordRepository {
    /// Create a new BorrowRecordRepository with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowRecordRepositoryTrait for BorrowRecordRepository {
    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<BorrowRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, book_id, borrow_date, return_date
            FROM borrow_records
            WHERE book_id = $1 AND return_date IS NULL
            ORDER BY borrow_date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_borrow_record).transpose()?)
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<BorrowRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, book_id, borrow_date, return_date
            FROM borrow_records
            WHERE book_id = $1
            ORDER BY borrow_date DESC, id DESC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(map_row_to_borrow_record)
            .collect::<sqlx::Result<_>>()?)
    }

    async fn find_history_for_user(&self, user_id: UserId) -> Result<Vec<BorrowHistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.user_id, r.book_id, r.borrow_date, r.return_date,
                   b.title AS book_title
            FROM borrow_records r
            JOIN books b ON b.id = r.book_id
            WHERE r.user_id = $1
            ORDER BY r.borrow_date DESC, r.id DESC
            "#,
        )
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            history.push(BorrowHistoryEntry {
                record: map_row_to_borrow_record(&row)?,
                book_title: row.try_get("book_title")?,
            });
        }

        Ok(history)
    }
}
