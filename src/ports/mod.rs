pub mod account_repository;
pub mod book_repository;
pub mod borrow_record_repository;
pub mod lending_store;

pub use account_repository::*;
pub use book_repository::*;
pub use borrow_record_repository::*;
pub use lending_store::*;

/// 書き込みの結果
///
/// 一意制約や状態の比較（compare-and-set）を満たさなかった場合は
/// エラーではなく値として返し、判断を呼び出し側に委ねる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome<T> {
    /// 書き込みが反映された
    Applied(T),
    /// 前提条件を満たさず反映されなかった（一意制約違反・状態の不一致）
    Conflict,
    /// 対象が存在しない
    Missing,
}
