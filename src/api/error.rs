use crate::application::accounts::AccountError;
use crate::application::library::{ErrorKind, LibraryError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーと認証エラーをまとめ、HTTPレスポンスへの
/// マッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Library(LibraryError),
    Account(AccountError),
    /// 認証情報がない・不正・期限切れ
    Unauthorized(String),
    /// トークンの発行などサーバー側の失敗
    Internal(String),
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        ApiError::Library(err)
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        ApiError::Account(err)
    }
}

fn library_status(kind: ErrorKind) -> StatusCode {
    match kind {
        // 曖昧な一致も「1冊に特定できない」ものとして404
        ErrorKind::NotFound | ErrorKind::Ambiguous => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyBorrowed
        | ErrorKind::NotBorrowed
        | ErrorKind::InvalidBook
        | ErrorKind::Inconsistent => StatusCode::BAD_REQUEST,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::DuplicateIsbn | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Library(err) => {
                let kind = err.kind();
                let status = library_status(kind);

                // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
                let body = match err {
                    LibraryError::Ambiguous {
                        count,
                        ref preview,
                        ..
                    } => ErrorResponse::new(kind.as_str(), err.to_string())
                        .with_candidates(count, preview.clone()),
                    LibraryError::BookRepositoryError(ref e)
                    | LibraryError::BorrowRecordRepositoryError(ref e)
                    | LibraryError::LendingStoreError(ref e) => {
                        tracing::error!("{}: {}", err, e);
                        ErrorResponse::new(kind.as_str(), "An unexpected error occurred")
                    }
                    _ => ErrorResponse::new(kind.as_str(), err.to_string()),
                };

                (status, body)
            }

            ApiError::Account(err) => match err {
                AccountError::InvalidUsername(_) => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("INVALID_USERNAME", err.to_string()),
                ),
                AccountError::WeakPassword(_) => (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("WEAK_PASSWORD", err.to_string()),
                ),
                AccountError::UsernameTaken(_) => (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("USERNAME_TAKEN", err.to_string()),
                ),
                AccountError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new("UNAUTHORIZED", err.to_string()),
                ),
                AccountError::PasswordHash(ref msg) => {
                    tracing::error!("Password hashing error: {}", msg);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("INTERNAL_ERROR", "An unexpected error occurred"),
                    )
                }
                AccountError::RepositoryError(ref e) => {
                    tracing::error!("Account repository error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("STORE_FAILURE", "An unexpected error occurred"),
                    )
                }
            },

            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("UNAUTHORIZED", msg),
            ),

            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_status_mapping() {
        assert_eq!(library_status(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(library_status(ErrorKind::Ambiguous), StatusCode::NOT_FOUND);
        assert_eq!(
            library_status(ErrorKind::AlreadyBorrowed),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(library_status(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(library_status(ErrorKind::DuplicateIsbn), StatusCode::CONFLICT);
        assert_eq!(
            library_status(ErrorKind::StoreFailure),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_failure_hides_details() {
        let err = ApiError::from(LibraryError::LendingStoreError("connection reset".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
