use crate::application::{
    ServiceDependencies,
    library::{self, borrow_book as execute_borrow_book, return_book as execute_return_book},
};
use crate::config::AuthConfig;
use crate::domain::commands::{BorrowBook, ReturnBook};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    auth::AuthenticatedUser,
    error::ApiError,
    types::{
        BookPatchRequest, BookRequest, BookResponse, BorrowResponse, HistoryEntryResponse,
        ListBooksQuery, ReturnResponse,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub auth: AuthConfig,
}

// ============================================================================
// Lending handlers (POST)
// ============================================================================

/// POST /api/books/:token/borrow - 書籍を借りる
///
/// tokenは書籍IDまたはタイトルの一部。1冊に特定できない場合は404。
///
/// 強制されるビジネスルール:
/// - 書籍が貸出可能であること（貸出中は400 ALREADY_BORROWED）
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(token): Path<String>,
) -> Result<Json<BorrowResponse>, ApiError> {
    let cmd = BorrowBook {
        token,
        caller,
        borrowed_at: chrono::Utc::now(),
    };

    let receipt = execute_borrow_book(&state.service_deps, cmd).await?;

    Ok(Json(BorrowResponse::from(receipt)))
}

/// POST /api/books/:token/return - 書籍を返却
///
/// 強制されるビジネスルール:
/// - 書籍が貸出中であること（館内にある場合は400 NOT_BORROWED）
///
/// 未返却の記録がなかった場合も200を返し、warningで不整合を知らせる。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(token): Path<String>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let cmd = ReturnBook {
        token,
        caller,
        returned_at: chrono::Utc::now(),
    };

    let receipt = execute_return_book(&state.service_deps, cmd).await?;

    Ok(Json(ReturnResponse::from(receipt)))
}

// ============================================================================
// Catalog handlers
// ============================================================================

/// GET /api/books - 書籍一覧
///
/// クエリパラメータ:
/// - q: 書籍IDまたはタイトルの一部（オプション）。一致しなければ空の一覧
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_): AuthenticatedUser,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = library::list_books(&state.service_deps, query.q.as_deref()).await?;

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /api/books/:token - トークンに一致する書籍
///
/// IDが一致すればその1冊、そうでなければタイトルが一致するすべての書籍。
pub async fn get_books(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_): AuthenticatedUser,
    Path(token): Path<String>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = library::search_books(&state.service_deps, &token).await?;

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// POST /api/books - 書籍を登録（管理者のみ）
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = library::create_book(&state.service_deps, &caller, req.into_details()).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// PUT /api/books/:token - 書籍を全体更新（管理者のみ）
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(token): Path<String>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book =
        library::update_book(&state.service_deps, &caller, &token, req.into_details()).await?;

    Ok(Json(BookResponse::from(book)))
}

/// PATCH /api/books/:token - 書籍を部分更新（管理者のみ）
pub async fn patch_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(token): Path<String>,
    Json(req): Json<BookPatchRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = library::patch_book(&state.service_deps, &caller, &token, req.into_patch()).await?;

    Ok(Json(BookResponse::from(book)))
}

/// DELETE /api/books/:token - 書籍を削除（管理者のみ）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    library::delete_book(&state.service_deps, &caller, &token).await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// History handler
// ============================================================================

/// GET /api/history - 呼び出し元の貸出履歴（新しい順）
pub async fn borrow_history(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> Result<Json<Vec<HistoryEntryResponse>>, ApiError> {
    let history = library::borrow_history(&state.service_deps, &caller).await?;

    Ok(Json(
        history.into_iter().map(HistoryEntryResponse::from).collect(),
    ))
}
