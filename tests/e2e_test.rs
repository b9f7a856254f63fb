use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use library_lending::api::handlers::AppState;
use library_lending::api::router::create_router;
use library_lending::api::types::*;
use library_lending::application::accounts::ensure_admin;
use library_lending::config::AuthConfig;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

use common::{MemoryApp, book_details, memory_app};

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

const ADMIN: (&str, &str) = ("librarian", "shelf-keeper-42");

/// E2Eテスト用のアプリケーションセットアップ
///
/// インメモリアダプターと実際のAPIルーターを使用します。
/// 管理者アカウントは起動時と同じ方法で作成します。
async fn setup_e2e_app() -> (axum::Router, MemoryApp) {
    let app = memory_app();
    ensure_admin(&app.deps, ADMIN.0, ADMIN.1).await.unwrap();

    let state = Arc::new(AppState {
        service_deps: app.deps.clone(),
        auth: AuthConfig {
            jwt_secret: "e2e-secret".to_string(),
            ..AuthConfig::default()
        },
    });

    (create_router(state), app)
}

async fn send(router: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(router: &axum::Router, username: &str, password: &str) -> TokenPairResponse {
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/token",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    serde_json::from_value(body).unwrap()
}

/// 一般利用者を登録してアクセストークンを返す
async fn register_member(router: &axum::Router, username: &str) -> String {
    let password = "correct horse battery";
    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/register",
            None,
            json!({ "username": username, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    login(router, username, password).await.access
}

// ============================================================================
// E2Eテスト
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (router, _) = setup_e2e_app().await;

    let (status, body) = send(&router, empty_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let (router, app) = setup_e2e_app().await;
    app.library.add_book(book_details("Dune", "9780441013593"));
    let token = register_member(&router, "alice").await;

    // 貸出
    let (status, body) = send(
        &router,
        empty_request("POST", "/api/books/dune/borrow", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let borrowed: BorrowResponse = serde_json::from_value(body).unwrap();
    assert!(borrowed.book.is_borrowed);
    assert_eq!(borrowed.message, "You borrowed 'Dune'");

    // 貸出中の書籍は再度借りられない
    let (status, body) = send(
        &router,
        empty_request("POST", "/api/books/1/borrow", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ALREADY_BORROWED");

    // 返却
    let (status, body) = send(
        &router,
        empty_request("POST", "/api/books/1/return", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let returned: ReturnResponse = serde_json::from_value(body).unwrap();
    assert_eq!(returned.record_id, Some(borrowed.record_id));
    assert!(returned.warning.is_none());

    // 返却済みの書籍は返却できない
    let (status, body) = send(
        &router,
        empty_request("POST", "/api/books/1/return", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "NOT_BORROWED");

    // 履歴
    let (status, body) = send(&router, empty_request("GET", "/api/history", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    let history: Vec<HistoryEntryResponse> = serde_json::from_value(body).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].book_title, "Dune");
    assert!(history[0].return_date.is_some());
}

#[tokio::test]
async fn test_ambiguous_and_missing_tokens_are_404() {
    let (router, app) = setup_e2e_app().await;
    app.library.add_book(book_details("Potter 1", "a"));
    app.library.add_book(book_details("Potter 2", "b"));
    let token = register_member(&router, "alice").await;

    let (status, body) = send(
        &router,
        empty_request("POST", "/api/books/potter/borrow", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "AMBIGUOUS");
    assert_eq!(body["candidates"], 2);
    assert_eq!(body["preview"], json!(["Potter 1", "Potter 2"]));

    let (status, body) = send(
        &router,
        empty_request("POST", "/api/books/dune/borrow", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    // 一覧用の検索は複数件をそのまま返す
    let (status, body) = send(&router, empty_request("GET", "/api/books/potter", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(
        &router,
        empty_request("GET", "/api/books?q=nothing", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_inconsistent_return_is_success_with_warning() {
    let (router, app) = setup_e2e_app().await;
    let book = app.library.add_book(book_details("Dune", "1"));
    app.library.set_borrowed_flag(book.id, true);
    let token = register_member(&router, "alice").await;

    let (status, body) = send(
        &router,
        empty_request("POST", "/api/books/dune/return", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["warning"], "INCONSISTENT");
    assert_eq!(body["book"]["is_borrowed"], false);
}

#[tokio::test]
async fn test_authentication_is_required() {
    let (router, app) = setup_e2e_app().await;
    app.library.add_book(book_details("Dune", "1"));

    let (status, body) = send(&router, empty_request("GET", "/api/books", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = send(
        &router,
        empty_request("GET", "/api/books", Some("not-a-jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // リフレッシュトークンはアクセストークンとして使えない
    let pair = login(&router, ADMIN.0, ADMIN.1).await;
    let (status, _) = send(&router, empty_request("GET", "/api/books", Some(&pair.refresh))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bare_authorization_header_is_accepted() {
    let (router, _) = setup_e2e_app().await;
    let pair = login(&router, ADMIN.0, ADMIN.1).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/books")
        .header(header::AUTHORIZATION, pair.access)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_refresh_issues_new_access_token() {
    let (router, _) = setup_e2e_app().await;
    let pair = login(&router, ADMIN.0, ADMIN.1).await;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/token/refresh",
            None,
            json!({ "refresh": pair.refresh }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let refreshed: AccessTokenResponse = serde_json::from_value(body).unwrap();

    let (status, _) = send(
        &router,
        empty_request("GET", "/api/history", Some(&refreshed.access)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // アクセストークンではリフレッシュできない
    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/token/refresh",
            None,
            json!({ "refresh": pair.access }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let (router, _) = setup_e2e_app().await;
    register_member(&router, "alice").await;

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/register",
            None,
            json!({ "username": "alice", "password": "another good one" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "USERNAME_TAKEN");

    let (status, body) = send(
        &router,
        json_request(
            "POST",
            "/api/register",
            None,
            json!({ "username": "bob", "password": "12345678" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "WEAK_PASSWORD");

    let (status, _) = send(
        &router,
        json_request(
            "POST",
            "/api/token",
            None,
            json!({ "username": "alice", "password": "wrong password" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_administration() {
    let (router, app) = setup_e2e_app().await;
    let admin = login(&router, ADMIN.0, ADMIN.1).await.access;
    let member = register_member(&router, "alice").await;

    let new_book = json!({
        "title": "Dune",
        "author": "Frank Herbert",
        "isbn": "9780441013593",
        "publish_date": "1965-08-01",
        "price": "10.99"
    });

    // 一般利用者は登録できない
    let (status, body) = send(
        &router,
        json_request("POST", "/api/books", Some(&member), new_book.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, body) = send(
        &router,
        json_request("POST", "/api/books", Some(&admin), new_book.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: BookResponse = serde_json::from_value(body).unwrap();
    assert!(!created.is_borrowed);

    // ISBNの重複
    let (status, body) = send(
        &router,
        json_request("POST", "/api/books", Some(&admin), new_book),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DUPLICATE_ISBN");

    // 部分更新（is_borrowedは無視される）
    let (status, body) = send(
        &router,
        json_request(
            "PATCH",
            "/api/books/dune",
            Some(&admin),
            json!({ "title": "Dune (Deluxe)", "is_borrowed": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Dune (Deluxe)");
    assert_eq!(body["is_borrowed"], false);

    // 空白のみのタイトルは不可
    let (status, body) = send(
        &router,
        json_request(
            "PATCH",
            &format!("/api/books/{}", created.id),
            Some(&admin),
            json!({ "title": "   " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_BOOK");

    // 削除
    let (status, _) = send(
        &router,
        empty_request("DELETE", &format!("/api/books/{}", created.id), Some(&member)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        empty_request("DELETE", &format!("/api/books/{}", created.id), Some(&admin)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.library.book(library_lending::domain::BookId::new(created.id)).is_none());
}
