use crate::application::ServiceDependencies;
use crate::domain::{
    self, Book, BorrowBookError, BorrowRecord, Caller, ReturnBookError, commands::*,
};
use crate::ports::{BorrowHistoryEntry, WriteOutcome};

use super::errors::{LibraryError, Result};
use super::resolver::{reload_book, resolve_book};

/// 確定の最大試行回数（初回 + 競合時の再試行1回）
const MAX_COMMIT_ATTEMPTS: u32 = 2;

/// 貸出の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowReceipt {
    pub book: Book,
    pub record: BorrowRecord,
}

/// 返却の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnReceipt {
    pub book: Book,
    /// 閉じた貸出記録。未返却の記録がなかった場合はNone
    pub closed_record: Option<BorrowRecord>,
}

impl ReturnReceipt {
    /// 書籍は返却されたが対応する未返却記録がなかった（データ不整合）
    pub fn is_inconsistent(&self) -> bool {
        self.closed_record.is_none()
    }
}

/// 書籍を借りる
///
/// ビジネスルール：
/// - トークンで書籍を解決できること
/// - 書籍が貸出可能であること（貸出中はAlreadyBorrowed）
///
/// # 一貫性保証
///
/// 書籍状態の更新と貸出記録の作成はLendingStoreが1つのトランザクションで
/// 確定する（is_borrowedのcompare-and-set）。確定時に競合した場合は
/// 書籍を再読込して1回だけ再試行する。同時に2件の貸出が来ても
/// 成功するのは1件のみで、もう一方はAlreadyBorrowedになる。
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<BorrowReceipt> {
    let mut book = resolve_book(deps, &cmd.token).await?;

    for attempt in 1..=MAX_COMMIT_ATTEMPTS {
        // ドメイン層の純粋関数で状態遷移を判定
        let (borrowed, event) =
            domain::lending::borrow_book(&book, cmd.caller.user_id, cmd.borrowed_at).map_err(
                |e| match e {
                    BorrowBookError::AlreadyBorrowed => LibraryError::AlreadyBorrowed {
                        title: book.title.clone(),
                    },
                },
            )?;

        match deps
            .lending_store
            .commit_borrow(&event)
            .await
            .map_err(LibraryError::LendingStoreError)?
        {
            WriteOutcome::Applied(record) => {
                tracing::info!(
                    book_id = %borrowed.id,
                    record_id = record.id.value(),
                    user = %cmd.caller.username,
                    "book borrowed"
                );
                return Ok(BorrowReceipt {
                    book: borrowed,
                    record,
                });
            }
            WriteOutcome::Conflict if attempt < MAX_COMMIT_ATTEMPTS => {
                tracing::debug!(book_id = %book.id, attempt, "borrow conflicted, reloading book");
                book = reload_book(deps, book.id, &cmd.token).await?;
            }
            WriteOutcome::Conflict => break,
            WriteOutcome::Missing => {
                return Err(LibraryError::NotFound { token: cmd.token });
            }
        }
    }

    Err(LibraryError::Conflict)
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - トークンで書籍を解決できること
/// - 書籍が貸出中であること（館内にある場合はNotBorrowed）
/// - 最新の未返却記録（borrow_date降順の先頭）のみにreturn_dateを設定する
/// - 返却者が借りた本人かどうかは検証しない
///
/// 未返却の記録が見つからない場合でも書籍は貸出可能に戻し、
/// 不整合として警告ログを出す（呼び出し元には成功として返す）。
///
/// # 一貫性保証
///
/// borrow_book()と同じ。
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<ReturnReceipt> {
    let mut book = resolve_book(deps, &cmd.token).await?;

    // 返却者の検証を厳しくする場合はここで cmd.caller と貸出記録を照合する
    for attempt in 1..=MAX_COMMIT_ATTEMPTS {
        let (returned, event) =
            domain::lending::return_book(&book, cmd.caller.user_id, cmd.returned_at).map_err(
                |e| match e {
                    ReturnBookError::NotBorrowed => LibraryError::NotBorrowed {
                        title: book.title.clone(),
                    },
                },
            )?;

        match deps
            .lending_store
            .commit_return(&event)
            .await
            .map_err(LibraryError::LendingStoreError)?
        {
            WriteOutcome::Applied(commit) => {
                let receipt = ReturnReceipt {
                    book: returned,
                    closed_record: commit.closed_record,
                };

                match &receipt.closed_record {
                    Some(record) => tracing::info!(
                        book_id = %receipt.book.id,
                        record_id = record.id.value(),
                        user = %cmd.caller.username,
                        "book returned"
                    ),
                    None => tracing::warn!(
                        book_id = %receipt.book.id,
                        user = %cmd.caller.username,
                        "book returned but no open borrow record was found"
                    ),
                }

                return Ok(receipt);
            }
            WriteOutcome::Conflict if attempt < MAX_COMMIT_ATTEMPTS => {
                tracing::debug!(book_id = %book.id, attempt, "return conflicted, reloading book");
                book = reload_book(deps, book.id, &cmd.token).await?;
            }
            WriteOutcome::Conflict => break,
            WriteOutcome::Missing => {
                return Err(LibraryError::NotFound { token: cmd.token });
            }
        }
    }

    Err(LibraryError::Conflict)
}

/// 呼び出し元の貸出履歴（新しい順）
pub async fn borrow_history(
    deps: &ServiceDependencies,
    caller: &Caller,
) -> Result<Vec<BorrowHistoryEntry>> {
    deps.borrow_records
        .find_history_for_user(caller.user_id)
        .await
        .map_err(LibraryError::BorrowRecordRepositoryError)
}
