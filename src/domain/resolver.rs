use super::{Book, BookId, ResolveError};

/// 曖昧エラーに含めるタイトルの最大件数
pub const PREVIEW_LIMIT: usize = 3;

/// 純粋関数：トークンを数値IDとして解釈する
///
/// ASCII数字のみで構成され、IDの範囲に収まる場合のみSomeを返す。
/// 範囲外の数字列はタイトル検索にだけ使われる。
pub fn parse_book_id(token: &str) -> Option<BookId> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse::<i64>().ok().map(BookId::new)
}

/// 純粋関数：タイトルの部分一致（大文字小文字を区別しない）
pub fn title_matches(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(&needle.to_lowercase())
}

/// 純粋関数：タイトル一致の結果を1冊に絞り込む
///
/// ビジネスルール：
/// - 0件はNotFound
/// - 1件はその書籍
/// - 2件以上はAmbiguous（件数と先頭3件のタイトル）
pub fn select_single(matches: Vec<Book>) -> Result<Book, ResolveError> {
    let count = matches.len();
    let mut matches = matches.into_iter();

    match (matches.next(), count) {
        (None, _) => Err(ResolveError::NotFound),
        (Some(book), 1) => Ok(book),
        (Some(first), _) => {
            let preview = std::iter::once(first)
                .chain(matches)
                .take(PREVIEW_LIMIT)
                .map(|b| b.title)
                .collect();
            Err(ResolveError::Ambiguous { count, preview })
        }
    }
}
