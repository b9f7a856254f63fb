use crate::domain::{BookBorrowed, BookId, BookReturned, BorrowRecord};
use crate::ports::WriteOutcome;
use crate::ports::lending_store::{LendingStore as LendingStoreTrait, Result, ReturnCommit};
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use super::rows::{is_unique_violation, map_row_to_borrow_record};

/// PostgreSQL implementation of LendingStore
///
/// Each event is committed in a single transaction. The `is_borrowed` flag is
/// flipped with a conditional UPDATE, so a concurrent writer that changed the
/// flag first makes this UPDATE match zero rows and the event is reported as
/// a Conflict with nothing written.
pub struct LendingStore {
    pool: PgPool,
}

impl LendingStore {
    /// Create a new LendingStore with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Compare-and-set on `books.is_borrowed`
    ///
    /// Returns true when the flag was `expected` and has been set to `!expected`.
    async fn swap_borrowed_flag(
        conn: &mut PgConnection,
        book_id: BookId,
        expected: bool,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET is_borrowed = NOT is_borrowed
            WHERE id = $1 AND is_borrowed = $2
            "#,
        )
        .bind(book_id.value())
        .bind(expected)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Distinguish a lost compare-and-set from a deleted book
    async fn missed_outcome<T>(conn: &mut PgConnection, book_id: BookId) -> Result<WriteOutcome<T>> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id.value())
            .fetch_one(conn)
            .await?;

        Ok(if exists {
            WriteOutcome::Conflict
        } else {
            WriteOutcome::Missing
        })
    }
}

#[async_trait]
impl LendingStoreTrait for LendingStore {
    async fn commit_borrow(&self, event: &BookBorrowed) -> Result<WriteOutcome<BorrowRecord>> {
        let mut tx = self.pool.begin().await?;

        if !Self::swap_borrowed_flag(&mut tx, event.book_id, false).await? {
            let outcome = Self::missed_outcome(&mut tx, event.book_id).await?;
            tx.rollback().await?;
            return Ok(outcome);
        }

        // The partial unique index on open records backs up the flag check
        let inserted = sqlx::query(
            r#"
            INSERT INTO borrow_records (user_id, book_id, borrow_date)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, book_id, borrow_date, return_date
            "#,
        )
        .bind(event.user_id.value())
        .bind(event.book_id.value())
        .bind(event.borrowed_at)
        .fetch_one(&mut *tx)
        .await;

        let record = match inserted {
            Ok(row) => map_row_to_borrow_record(&row)?,
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                return Ok(WriteOutcome::Conflict);
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(WriteOutcome::Applied(record))
    }

    async fn commit_return(&self, event: &BookReturned) -> Result<WriteOutcome<ReturnCommit>> {
        let mut tx = self.pool.begin().await?;

        if !Self::swap_borrowed_flag(&mut tx, event.book_id, true).await? {
            let outcome = Self::missed_outcome(&mut tx, event.book_id).await?;
            tx.rollback().await?;
            return Ok(outcome);
        }

        // Only the most recent open record is closed
        let row = sqlx::query(
            r#"
            UPDATE borrow_records
            SET return_date = $2
            WHERE id = (
                SELECT id
                FROM borrow_records
                WHERE book_id = $1 AND return_date IS NULL
                ORDER BY borrow_date DESC, id DESC
                LIMIT 1
                FOR UPDATE
            )
            RETURNING id, user_id, book_id, borrow_date, return_date
            "#,
        )
        .bind(event.book_id.value())
        .bind(event.returned_at)
        .fetch_optional(&mut *tx)
        .await?;

        let closed_record = row.as_ref().map(map_row_to_borrow_record).transpose()?;

        tx.commit().await?;
        Ok(WriteOutcome::Applied(ReturnCommit { closed_record }))
    }
}
