use crate::ports::*;
use std::sync::Arc;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞いは持たず、アプリケーション層の関数に引数として渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub books: Arc<dyn BookRepository>,
    pub borrow_records: Arc<dyn BorrowRecordRepository>,
    pub lending_store: Arc<dyn LendingStore>,
    pub accounts: Arc<dyn AccountRepository>,
}
