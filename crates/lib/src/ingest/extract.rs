//! Content selection for feed entries.

use crate::ingest::types::FeedEntry;

/// Picks the text body of an entry, or `None` when it has nothing usable.
///
/// The summary wins whenever it has text, even if content blocks are present.
/// Otherwise the first content block's value is used. Whitespace-only text
/// counts as empty.
pub fn extract_content(entry: &FeedEntry) -> Option<&str> {
    let non_empty = |s: &str| !s.trim().is_empty();

    entry
        .summary
        .as_deref()
        .filter(|s| non_empty(s))
        .or_else(|| {
            entry
                .content
                .first()
                .map(|block| block.value.as_str())
                .filter(|s| non_empty(s))
        })
}
