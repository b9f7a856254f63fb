use crate::application::ServiceDependencies;
use crate::domain::{Book, BookDetails, BookPatch, Caller};
use crate::ports::WriteOutcome;

use super::errors::{LibraryError, Result};
use super::resolver::resolve_book;

/// 管理者権限の確認
fn require_admin(caller: &Caller) -> Result<()> {
    if !caller.is_admin {
        tracing::warn!(user = %caller.username, "non-admin attempted a catalog change");
        return Err(LibraryError::Forbidden);
    }
    Ok(())
}

async fn store_update(
    deps: &ServiceDependencies,
    token: &str,
    book: &Book,
    details: BookDetails,
) -> Result<Book> {
    let isbn = details.isbn.clone();

    match deps
        .books
        .update(book.id, details)
        .await
        .map_err(LibraryError::BookRepositoryError)?
    {
        WriteOutcome::Applied(updated) => {
            tracing::info!(book_id = %updated.id, "book updated");
            Ok(updated)
        }
        WriteOutcome::Conflict => Err(LibraryError::DuplicateIsbn { isbn }),
        WriteOutcome::Missing => Err(LibraryError::NotFound {
            token: token.to_string(),
        }),
    }
}

/// 書籍を登録する
///
/// ビジネスルール：
/// - 管理者のみ
/// - 属性のバリデーションを通ること
/// - ISBNが一意であること
/// - 登録直後は貸出可能
pub async fn create_book(
    deps: &ServiceDependencies,
    caller: &Caller,
    details: BookDetails,
) -> Result<Book> {
    require_admin(caller)?;
    details.validate().map_err(LibraryError::InvalidBook)?;

    let isbn = details.isbn.clone();
    match deps
        .books
        .insert(details)
        .await
        .map_err(LibraryError::BookRepositoryError)?
    {
        WriteOutcome::Applied(book) => {
            tracing::info!(book_id = %book.id, title = %book.title, "book created");
            Ok(book)
        }
        WriteOutcome::Conflict | WriteOutcome::Missing => Err(LibraryError::DuplicateIsbn { isbn }),
    }
}

/// 書籍の属性を全体更新する
///
/// 対象はトークンで解決する。貸出状態は変更しない。
pub async fn update_book(
    deps: &ServiceDependencies,
    caller: &Caller,
    token: &str,
    details: BookDetails,
) -> Result<Book> {
    require_admin(caller)?;
    details.validate().map_err(LibraryError::InvalidBook)?;

    let book = resolve_book(deps, token).await?;
    store_update(deps, token, &book, details).await
}

/// 書籍の属性を部分更新する
pub async fn patch_book(
    deps: &ServiceDependencies,
    caller: &Caller,
    token: &str,
    patch: BookPatch,
) -> Result<Book> {
    require_admin(caller)?;

    let book = resolve_book(deps, token).await?;
    let details = patch.apply_to(book.details());
    details.validate().map_err(LibraryError::InvalidBook)?;

    store_update(deps, token, &book, details).await
}

/// 書籍を削除する
///
/// 削除した書籍を返す。貸出記録はストア側で連鎖削除される。
pub async fn delete_book(deps: &ServiceDependencies, caller: &Caller, token: &str) -> Result<Book> {
    require_admin(caller)?;

    let book = resolve_book(deps, token).await?;
    let deleted = deps
        .books
        .delete(book.id)
        .await
        .map_err(LibraryError::BookRepositoryError)?;

    if !deleted {
        return Err(LibraryError::NotFound {
            token: token.to_string(),
        });
    }

    tracing::info!(book_id = %book.id, title = %book.title, "book deleted");
    Ok(book)
}
