pub mod account_repository;
pub mod book_repository;
pub mod borrow_record_repository;
pub mod lending_store;
mod rows;

// パブリックに型を再エクスポート
pub use account_repository::AccountRepository as PostgresAccountRepository;
pub use book_repository::BookRepository as PostgresBookRepository;
pub use borrow_record_repository::BorrowRecordRepository as PostgresBorrowRecordRepository;
pub use lending_store::LendingStore as PostgresLendingStore;
