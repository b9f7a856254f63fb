use crate::application::ServiceDependencies;
use crate::domain::{Book, BookId, resolver};

use super::errors::{LibraryError, Result};

/// 数値IDで書籍を検索する（IDとして解釈できるトークンのみ）
async fn find_by_id_token(deps: &ServiceDependencies, token: &str) -> Result<Option<Book>> {
    let Some(id) = resolver::parse_book_id(token) else {
        return Ok(None);
    };

    deps.books
        .get_by_id(id)
        .await
        .map_err(LibraryError::BookRepositoryError)
}

async fn find_by_title(deps: &ServiceDependencies, token: &str) -> Result<Vec<Book>> {
    deps.books
        .find_by_title_contains(token)
        .await
        .map_err(LibraryError::BookRepositoryError)
}

/// トークンから書籍を1冊に解決する
///
/// ビジネスルール：
/// - 数字のみのトークンはまずIDとして完全一致を試み、見つかれば即座に返す
/// - それ以外（またはIDが存在しない）はタイトルの部分一致（大文字小文字無視）
/// - 0件はNotFound、2件以上はAmbiguous（件数と先頭3件のタイトル）
pub async fn resolve_book(deps: &ServiceDependencies, token: &str) -> Result<Book> {
    if let Some(book) = find_by_id_token(deps, token).await? {
        return Ok(book);
    }

    let matches = find_by_title(deps, token).await?;
    resolver::select_single(matches).map_err(|e| LibraryError::from_resolve(token, e))
}

/// トークンに一致する書籍をすべて返す（一覧表示用）
///
/// IDが一致した場合はその1冊のみ。タイトル一致は絞り込まずにそのまま返す。
/// 1冊も一致しない場合のみNotFound。
pub async fn search_books(deps: &ServiceDependencies, token: &str) -> Result<Vec<Book>> {
    if let Some(book) = find_by_id_token(deps, token).await? {
        return Ok(vec![book]);
    }

    let matches = find_by_title(deps, token).await?;
    if matches.is_empty() {
        return Err(LibraryError::NotFound {
            token: token.to_string(),
        });
    }

    Ok(matches)
}

/// 書籍一覧（検索語は任意）
///
/// 検索語がなければ全件、あればsearch_booksと同じ規則で検索し、
/// 一致しない場合は空の一覧を返す。
pub async fn list_books(deps: &ServiceDependencies, query: Option<&str>) -> Result<Vec<Book>> {
    match query {
        None | Some("") => deps
            .books
            .list_all()
            .await
            .map_err(LibraryError::BookRepositoryError),
        Some(q) => match search_books(deps, q).await {
            Err(LibraryError::NotFound { .. }) => Ok(Vec::new()),
            other => other,
        },
    }
}

/// IDで書籍を再取得する（競合後の再読込用）
pub(super) async fn reload_book(deps: &ServiceDependencies, id: BookId, token: &str) -> Result<Book> {
    deps.books
        .get_by_id(id)
        .await
        .map_err(LibraryError::BookRepositoryError)?
        .ok_or_else(|| LibraryError::NotFound {
            token: token.to_string(),
        })
}
