//! Opaque pagination cursor
//!
//! A cursor records the last returned `(at, id)` pair and the filter it was
//! issued under. On the wire it is base64url (no padding) over a small JSON
//! object:
//!
//! ```text
//! {"at":1700000000000000,"id":"9f3c...","from":"A1"}
//! ```
//!
//! A cursor replayed against a different filter is rejected with
//! `CursorMismatch` instead of silently returning a page of another query.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tally_core::{
    TallyError, TallyResult, Timestamp, Transaction, TransactionFilter, TransactionId,
};

/// Decoded pagination cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    /// Creation time of the last returned transaction
    pub at: Timestamp,
    /// Id of the last returned transaction
    pub id: TransactionId,
    /// Source-account filter in effect when the cursor was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl PageCursor {
    /// Cursor positioned after `last`, bound to `filter`
    pub fn after(last: &Transaction, filter: &TransactionFilter) -> Self {
        PageCursor {
            at: last.at,
            id: last.id.clone(),
            from: filter.from_account_id.clone(),
        }
    }

    /// Encode to the opaque token form
    pub fn encode(&self) -> TallyResult<String> {
        let json = serde_json::to_vec(self).map_err(|e| TallyError::Serialization(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode an opaque token
    ///
    /// `None` or a blank token means "start from the beginning".
    ///
    /// # Errors
    ///
    /// `InvalidCursor` naming the failed stage: encoding, payload, or fields.
    pub fn decode(token: Option<&str>) -> TallyResult<Option<Self>> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(None),
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| TallyError::invalid_cursor("invalid cursor encoding"))?;
        let cursor: PageCursor = serde_json::from_slice(&bytes)
            .map_err(|_| TallyError::invalid_cursor("invalid cursor payload"))?;

        if cursor.at == Timestamp::EPOCH || cursor.id.as_str().trim().is_empty() {
            return Err(TallyError::invalid_cursor("invalid cursor fields"));
        }
        Ok(Some(cursor))
    }

    /// Reject the cursor if it was issued under a different filter
    pub fn check_filter(&self, filter: &TransactionFilter) -> TallyResult<()> {
        if self.from != filter.from_account_id {
            return Err(TallyError::CursorMismatch);
        }
        Ok(())
    }

    /// Sort key this cursor points after
    pub fn sort_key(&self) -> (Timestamp, &TransactionId) {
        (self.at, &self.id)
    }
}
