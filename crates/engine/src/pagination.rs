//! Keyset pagination over a snapshot of the record store
//!
//! Total order is `(at ASC, id ASC)`, so transactions created in the same
//! microsecond still have a deterministic position. A page starts at the first
//! element strictly greater than the cursor's `(at, id)`, and a next cursor is
//! emitted only when more elements remain after the page.

use serde::{Deserialize, Serialize};
use tally_core::{TallyError, TallyResult, Transaction, TransactionFilter};

use crate::cursor::PageCursor;

/// Parse a raw `limit` value
///
/// A missing or blank value gives `default`. Anything non-numeric, zero, or
/// above `max` is a validation error; out-of-range values are not clamped.
pub fn parse_limit(raw: Option<&str>, default: usize, max: usize) -> TallyResult<usize> {
    let raw = match raw.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return Ok(default),
    };
    let limit: usize = raw
        .parse()
        .map_err(|_| TallyError::validation(format!("invalid limit: {:?}", raw)))?;
    if limit == 0 || limit > max {
        return Err(TallyError::validation(format!(
            "limit must be between 1 and {}",
            max
        )));
    }
    Ok(limit)
}

/// One page of transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Transactions in `(at, id)` order
    pub items: Vec<Transaction>,
    /// Token for the next page; `None` on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Cut one page out of `items`
///
/// `items` must already be filtered by `filter`; they are sorted here.
pub fn paginate(
    mut items: Vec<Transaction>,
    filter: &TransactionFilter,
    after: Option<&PageCursor>,
    limit: usize,
) -> TallyResult<Page> {
    items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let start = match after {
        Some(cursor) => items.partition_point(|t| t.sort_key() <= cursor.sort_key()),
        None => 0,
    };
    let end = start.saturating_add(limit).min(items.len());

    let next_cursor = if end < items.len() && end > start {
        Some(PageCursor::after(&items[end - 1], filter).encode()?)
    } else {
        None
    };

    items.truncate(end);
    items.drain(..start);

    Ok(Page { items, next_cursor })
}
