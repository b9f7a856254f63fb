mod catalog_service;
mod errors;
mod lending_service;
mod resolver;

pub use catalog_service::{create_book, delete_book, patch_book, update_book};
pub use errors::{ErrorKind, LibraryError, Result};
pub use lending_service::{
    BorrowReceipt, ReturnReceipt, borrow_book, borrow_history, return_book,
};
pub use resolver::{list_books, resolve_book, search_books};
