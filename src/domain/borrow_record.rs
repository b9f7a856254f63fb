use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Book, BookId, BorrowRecordId, CloseRecordError, UserId};

/// 貸出記録 - 利用者と書籍の貸出期間を表す監査エントリ
///
/// return_dateがNoneの記録を「未返却の記録」と呼ぶ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub id: BorrowRecordId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub borrow_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

impl BorrowRecord {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}

/// 純粋関数：貸出記録を閉じる
///
/// return_dateは一度だけ設定できる。
pub fn close_record(
    record: &BorrowRecord,
    returned_at: DateTime<Utc>,
) -> Result<BorrowRecord, CloseRecordError> {
    if !record.is_open() {
        return Err(CloseRecordError::AlreadyClosed);
    }

    Ok(BorrowRecord {
        return_date: Some(returned_at),
        ..record.clone()
    })
}

/// 純粋関数：書籍の最新の未返却記録を選ぶ
///
/// borrow_dateの降順で先頭（同時刻ならIDの大きい方）を返す。
/// 挿入順には依存しない。
pub fn latest_open_record<'a, I>(records: I, book_id: BookId) -> Option<&'a BorrowRecord>
where
    I: IntoIterator<Item = &'a BorrowRecord>,
{
    records
        .into_iter()
        .filter(|r| r.book_id == book_id && r.is_open())
        .max_by_key(|r| (r.borrow_date, r.id))
}

/// 純粋関数：貸出の不変条件を検査する
///
/// - is_borrowed == true ⇔ 未返却の記録が存在する
/// - 未返却の記録は書籍ごとに最大1件
pub fn lending_invariant_holds(book: &Book, records: &[BorrowRecord]) -> bool {
    let open = records
        .iter()
        .filter(|r| r.book_id == book.id && r.is_open())
        .count();

    match book.is_borrowed {
        true => open == 1,
        false => open == 0,
    }
}
