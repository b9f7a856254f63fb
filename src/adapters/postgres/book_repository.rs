use crate::domain::{Book, BookDetails, BookId};
use crate::ports::WriteOutcome;
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use super::rows::{contains_pattern, is_unique_violation, map_row_to_book};

/// PostgreSQL implementation of BookRepository
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    /// Create a new BookRepository with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, author, isbn, publish_date, price, is_borrowed
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_book).transpose()?)
    }

    /// Case-insensitive title substring search
    ///
    /// Wildcards in the search text are matched literally.
    async fn find_by_title_contains(&self, text: &str) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, author, isbn, publish_date, price, is_borrowed
            FROM books
            WHERE title ILIKE $1 ESCAPE '\'
            ORDER BY id ASC
            "#,
        )
        .bind(contains_pattern(text))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_book).collect::<sqlx::Result<_>>()?)
    }

    async fn list_all(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, author, isbn, publish_date, price, is_borrowed
            FROM books
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_book).collect::<sqlx::Result<_>>()?)
    }

    async fn insert(&self, details: BookDetails) -> Result<WriteOutcome<Book>> {
        let result = sqlx::query(
            r#"
            INSERT INTO books (title, author, isbn, publish_date, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, author, isbn, publish_date, price, is_borrowed
            "#,
        )
        .bind(&details.title)
        .bind(&details.author)
        .bind(&details.isbn)
        .bind(details.publish_date)
        .bind(details.price)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(WriteOutcome::Applied(map_row_to_book(&row)?)),
            Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the editable columns. `is_borrowed` is left untouched.
    async fn update(&self, id: BookId, details: BookDetails) -> Result<WriteOutcome<Book>> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2,
                author = $3,
                isbn = $4,
                publish_date = $5,
                price = $6
            WHERE id = $1
            RETURNING id, title, author, isbn, publish_date, price, is_borrowed
            "#,
        )
        .bind(id.value())
        .bind(&details.title)
        .bind(&details.author)
        .bind(&details.isbn)
        .bind(details.publish_date)
        .bind(details.price)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(row)) => Ok(WriteOutcome::Applied(map_row_to_book(&row)?)),
            Ok(None) => Ok(WriteOutcome::Missing),
            Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
