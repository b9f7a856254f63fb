use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::auth::{obtain_token, refresh_token, register};
use super::handlers::{
    AppState, borrow_book, borrow_history, create_book, delete_book, get_books, list_books,
    patch_book, return_book, update_book,
};

/// Creates the API router
///
/// Account endpoints (no authentication):
/// - POST /api/register - Register a user
/// - POST /api/token - Obtain access and refresh tokens
/// - POST /api/token/refresh - Refresh the access token
///
/// Book endpoints (`:token` is a book id or part of a title):
/// - GET /api/books - List books, optionally filtered by `q`
/// - POST /api/books - Create a book (admin)
/// - GET /api/books/:token - Books matching the token
/// - PUT/PATCH/DELETE /api/books/:token - Edit or delete a book (admin)
/// - POST /api/books/:token/borrow - Borrow a book
/// - POST /api/books/:token/return - Return a book
/// - GET /api/history - Caller's borrow history
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Account endpoints
        .route("/api/register", post(register))
        .route("/api/token", post(obtain_token))
        .route("/api/token/refresh", post(refresh_token))
        // Book endpoints
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/:token",
            get(get_books)
                .put(update_book)
                .patch(patch_book)
                .delete(delete_book),
        )
        .route("/api/books/:token/borrow", post(borrow_book))
        .route("/api/books/:token/return", post(return_book))
        .route("/api/history", get(borrow_history))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
