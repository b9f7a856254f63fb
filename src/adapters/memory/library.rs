use crate::domain::{
    Book, BookBorrowed, BookDetails, BookId, BookReturned, BorrowRecord, BorrowRecordId, UserId,
    close_record, latest_open_record, resolver::title_matches,
};
use crate::ports::{
    BookRepository, BorrowHistoryEntry, BorrowRecordRepository, LendingStore, ReturnCommit,
    WriteOutcome,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Default)]
struct State {
    books: BTreeMap<BookId, Book>,
    records: Vec<BorrowRecord>,
    last_book_id: i64,
    last_record_id: i64,
}

/// 書籍・貸出記録・貸出ストアのインメモリ実装
///
/// 1つのMutexで全データを保護するため、commit_borrow / commit_return は
/// PostgreSQL実装のトランザクションと同じくアトミックに振る舞う。
/// テストと `storage.backend = "memory"` での開発起動に使用する。
pub struct Library {
    state: Mutex<State>,
}

impl Library {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// テスト用に書籍を直接登録（ISBNの重複は検査しない）
    pub fn add_book(&self, details: BookDetails) -> Book {
        let mut state = self.lock();
        state.last_book_id += 1;
        let book = Book::from_details(BookId::new(state.last_book_id), details);
        state.books.insert(book.id, book.clone());
        book
    }

    /// テスト用に貸出フラグだけを書き換える
    ///
    /// 未返却記録のない貸出中状態（データ不整合）を再現するために使う。
    pub fn set_borrowed_flag(&self, id: BookId, is_borrowed: bool) {
        if let Some(book) = self.lock().books.get_mut(&id) {
            book.is_borrowed = is_borrowed;
        }
    }

    /// 現在の書籍のスナップショット
    pub fn book(&self, id: BookId) -> Option<Book> {
        self.lock().books.get(&id).cloned()
    }

    /// 全貸出記録のスナップショット（作成順）
    pub fn records(&self) -> Vec<BorrowRecord> {
        self.lock().records.clone()
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookRepository for Library {
    async fn get_by_id(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.lock().books.get(&id).cloned())
    }

    async fn find_by_title_contains(&self, text: &str) -> Result<Vec<Book>> {
        Ok(self
            .lock()
            .books
            .values()
            .filter(|b| title_matches(&b.title, text))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Book>> {
        Ok(self.lock().books.values().cloned().collect())
    }

    async fn insert(&self, details: BookDetails) -> Result<WriteOutcome<Book>> {
        let mut state = self.lock();

        if state.books.values().any(|b| b.isbn == details.isbn) {
            return Ok(WriteOutcome::Conflict);
        }

        state.last_book_id += 1;
        let book = Book::from_details(BookId::new(state.last_book_id), details);
        state.books.insert(book.id, book.clone());

        Ok(WriteOutcome::Applied(book))
    }

    async fn update(&self, id: BookId, details: BookDetails) -> Result<WriteOutcome<Book>> {
        let mut state = self.lock();

        if state
            .books
            .values()
            .any(|b| b.id != id && b.isbn == details.isbn)
        {
            return Ok(WriteOutcome::Conflict);
        }

        match state.books.get_mut(&id) {
            Some(book) => {
                *book = book.with_details(details);
                Ok(WriteOutcome::Applied(book.clone()))
            }
            None => Ok(WriteOutcome::Missing),
        }
    }

    async fn delete(&self, id: BookId) -> Result<bool> {
        let mut state = self.lock();
        let removed = state.books.remove(&id).is_some();
        // 外部キーのON DELETE CASCADEと同じ扱い
        state.records.retain(|r| r.book_id != id);
        Ok(removed)
    }
}

#[async_trait]
impl BorrowRecordRepository for Library {
    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<BorrowRecord>> {
        Ok(latest_open_record(&self.lock().records, book_id).cloned())
    }

    async fn find_by_book(&self, book_id: BookId) -> Result<Vec<BorrowRecord>> {
        let mut records: Vec<BorrowRecord> = self
            .lock()
            .records
            .iter()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (b.borrow_date, b.id).cmp(&(a.borrow_date, a.id)));
        Ok(records)
    }

    async fn find_history_for_user(&self, user_id: UserId) -> Result<Vec<BorrowHistoryEntry>> {
        let state = self.lock();
        let mut entries: Vec<BorrowHistoryEntry> = state
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                state.books.get(&r.book_id).map(|b| BorrowHistoryEntry {
                    record: r.clone(),
                    book_title: b.title.clone(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            (b.record.borrow_date, b.record.id).cmp(&(a.record.borrow_date, a.record.id))
        });
        Ok(entries)
    }
}

#[async_trait]
impl LendingStore for Library {
    async fn commit_borrow(&self, event: &BookBorrowed) -> Result<WriteOutcome<BorrowRecord>> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let Some(book) = state.books.get_mut(&event.book_id) else {
            return Ok(WriteOutcome::Missing);
        };
        // compare-and-set: false → true
        if book.is_borrowed {
            return Ok(WriteOutcome::Conflict);
        }
        book.is_borrowed = true;

        state.last_record_id += 1;
        let record = BorrowRecord {
            id: BorrowRecordId::new(state.last_record_id),
            user_id: event.user_id,
            book_id: event.book_id,
            borrow_date: event.borrowed_at,
            return_date: None,
        };
        state.records.push(record.clone());

        Ok(WriteOutcome::Applied(record))
    }

    async fn commit_return(&self, event: &BookReturned) -> Result<WriteOutcome<ReturnCommit>> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let Some(book) = state.books.get_mut(&event.book_id) else {
            return Ok(WriteOutcome::Missing);
        };
        // compare-and-set: true → false
        if !book.is_borrowed {
            return Ok(WriteOutcome::Conflict);
        }
        book.is_borrowed = false;

        let latest_id = latest_open_record(&state.records, event.book_id).map(|r| r.id);
        let closed_record = latest_id.and_then(|id| {
            let slot = state.records.iter_mut().find(|r| r.id == id)?;
            let closed = close_record(slot, event.returned_at).ok()?;
            *slot = closed.clone();
            Some(closed)
        });

        Ok(WriteOutcome::Applied(ReturnCommit { closed_record }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use rust_decimal::Decimal;

    fn details(title: &str, isbn: &str) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            author: "Author".to_string(),
            isbn: isbn.to_string(),
            publish_date: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            price: Decimal::new(2500, 2),
        }
    }

    fn borrowed(book_id: BookId, at: chrono::DateTime<Utc>) -> BookBorrowed {
        BookBorrowed {
            book_id,
            user_id: UserId::new(),
            borrowed_at: at,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_isbn() {
        let library = Library::new();
        library.insert(details("A", "111")).await.unwrap();

        let result = library.insert(details("B", "111")).await.unwrap();
        assert_eq!(result, WriteOutcome::Conflict);
    }

    #[tokio::test]
    async fn test_update_keeps_borrowed_flag_and_checks_isbn() {
        let library = Library::new();
        let a = library.add_book(details("A", "111"));
        library.add_book(details("B", "222"));
        library.set_borrowed_flag(a.id, true);

        let clash = library.update(a.id, details("A2", "222")).await.unwrap();
        assert_eq!(clash, WriteOutcome::Conflict);

        match library.update(a.id, details("A2", "111")).await.unwrap() {
            WriteOutcome::Applied(book) => {
                assert_eq!(book.title, "A2");
                assert!(book.is_borrowed);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let missing = library
            .update(BookId::new(99), details("X", "999"))
            .await
            .unwrap();
        assert_eq!(missing, WriteOutcome::Missing);
    }

    #[tokio::test]
    async fn test_find_by_title_contains_is_case_insensitive_and_ordered() {
        let library = Library::new();
        library.add_book(details("Harry Potter 2", "1"));
        library.add_book(details("Dune", "2"));
        library.add_book(details("harry potter 1", "3"));

        let found = library.find_by_title_contains("HARRY").await.unwrap();
        let ids: Vec<i64> = found.iter().map(|b| b.id.value()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_commit_borrow_is_compare_and_set() {
        let library = Library::new();
        let book = library.add_book(details("A", "111"));
        let now = Utc::now();

        let first = library.commit_borrow(&borrowed(book.id, now)).await.unwrap();
        assert!(matches!(first, WriteOutcome::Applied(_)));

        let second = library.commit_borrow(&borrowed(book.id, now)).await.unwrap();
        assert_eq!(second, WriteOutcome::Conflict);
        assert_eq!(library.records().len(), 1);

        let missing = library
            .commit_borrow(&borrowed(BookId::new(42), now))
            .await
            .unwrap();
        assert_eq!(missing, WriteOutcome::Missing);
    }

    #[tokio::test]
    async fn test_commit_return_closes_latest_open_record() {
        let library = Library::new();
        let book = library.add_book(details("A", "111"));
        let start = Utc::now() - Duration::days(10);

        library
            .commit_borrow(&borrowed(book.id, start))
            .await
            .unwrap();
        let returned_at = start + Duration::days(2);
        let event = BookReturned {
            book_id: book.id,
            returned_by: UserId::new(),
            returned_at,
        };

        match library.commit_return(&event).await.unwrap() {
            WriteOutcome::Applied(commit) => {
                let closed = commit.closed_record.unwrap();
                assert_eq!(closed.return_date, Some(returned_at));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!library.book(book.id).unwrap().is_borrowed);

        // 2回目は貸出中ではないためConflict
        let again = library.commit_return(&event).await.unwrap();
        assert_eq!(again, WriteOutcome::Conflict);
    }

    #[tokio::test]
    async fn test_commit_return_without_open_record() {
        let library = Library::new();
        let book = library.add_book(details("A", "111"));
        library.set_borrowed_flag(book.id, true);

        let event = BookReturned {
            book_id: book.id,
            returned_by: UserId::new(),
            returned_at: Utc::now(),
        };
        let outcome = library.commit_return(&event).await.unwrap();

        assert_eq!(
            outcome,
            WriteOutcome::Applied(ReturnCommit {
                closed_record: None
            })
        );
        assert!(!library.book(book.id).unwrap().is_borrowed);
    }

    #[tokio::test]
    async fn test_delete_cascades_records() {
        let library = Library::new();
        let book = library.add_book(details("A", "111"));
        library
            .commit_borrow(&borrowed(book.id, Utc::now()))
            .await
            .unwrap();

        assert!(library.delete(book.id).await.unwrap());
        assert!(library.records().is_empty());
        assert!(!library.delete(book.id).await.unwrap());
    }
}
