//! Domain types: transactions, their ids and status, inbound requests,
//! list filters and request fingerprints.

use crate::timestamp::{self, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// TransactionId
// ============================================================================

/// Opaque, globally unique transaction identifier
///
/// Generated from 128 random bits and rendered as 32 lowercase hex digits.
/// Ids are never reused. Ordering is lexicographic, which pagination uses as
/// the tie-break for transactions created in the same microsecond.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        TransactionId(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing id string (e.g. a path segment)
    pub fn from_string(id: impl Into<String>) -> Self {
        TransactionId(id.into())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TransactionStatus
// ============================================================================

/// Lifecycle status of a transaction
///
/// Every transaction starts `Pending`. Nothing in this crate drives the
/// later transitions, but the type carries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Accepted, not yet settled
    #[default]
    Pending,
    /// Settled successfully
    Completed,
    /// Settlement failed
    Failed,
}

impl TransactionStatus {
    /// Lowercase wire name
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    /// True once the status can no longer change
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "failed" => Ok(TransactionStatus::Failed),
            other => Err(format!("invalid status: {:?}", other)),
        }
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// A transfer between two accounts, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique id, generated at creation
    pub id: TransactionId,
    /// Source account
    pub from_account_id: String,
    /// Destination account
    pub to_account_id: String,
    /// Positive, finite amount
    pub amount: f64,
    /// Creation time
    #[serde(with = "timestamp::rfc3339")]
    pub at: Timestamp,
    /// Lifecycle status
    pub status: TransactionStatus,
}

impl Transaction {
    /// Create a new pending transaction from a (validated) request
    ///
    /// Assigns a fresh id and the current time.
    pub fn from_request(request: &TransactionRequest) -> Self {
        Self::from_request_at(request, Timestamp::now())
    }

    /// Same as [`Transaction::from_request`] with an explicit creation time
    pub fn from_request_at(request: &TransactionRequest, at: Timestamp) -> Self {
        Transaction {
            id: TransactionId::new(),
            from_account_id: request.from_account_id.clone(),
            to_account_id: request.to_account_id.clone(),
            amount: request.amount,
            at,
            status: TransactionStatus::Pending,
        }
    }

    /// Sort key for pagination: `(at, id)`
    pub fn sort_key(&self) -> (Timestamp, &TransactionId) {
        (self.at, &self.id)
    }
}

// ============================================================================
// TransactionRequest
// ============================================================================

/// Inbound create request
///
/// Field order here is the canonical serialization order used for
/// fingerprinting. Do not reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionRequest {
    /// Source account
    pub from_account_id: String,
    /// Destination account
    pub to_account_id: String,
    /// Amount to transfer
    pub amount: f64,
}

impl TransactionRequest {
    /// Convenience constructor
    pub fn new(from: impl Into<String>, to: impl Into<String>, amount: f64) -> Self {
        TransactionRequest {
            from_account_id: from.into(),
            to_account_id: to.into(),
            amount,
        }
    }
}

// ============================================================================
// TransactionFilter
// ============================================================================

/// Predicate applied when listing transactions
///
/// `from_account_id = None` matches every transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Only transactions debiting this account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account_id: Option<String>,
}

impl TransactionFilter {
    /// Filter that matches everything
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter by source account
    ///
    /// Blank input (after trimming) means no filter.
    pub fn from_account(account: impl AsRef<str>) -> Self {
        let trimmed = account.as_ref().trim();
        TransactionFilter {
            from_account_id: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        }
    }

    /// Test a transaction against this filter
    pub fn matches(&self, txn: &Transaction) -> bool {
        match &self.from_account_id {
            Some(from) => txn.from_account_id == *from,
            None => true,
        }
    }
}

// ============================================================================
// Fingerprint
// ============================================================================

/// SHA-256 digest of a canonicalized request payload
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Wrap raw digest bytes
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Fingerprint(bytes)
    }

    /// Raw digest bytes
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_transaction_id_is_32_hex() {
        let id = TransactionId::new();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_transaction_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| TransactionId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Pending).unwrap(),
            "\"pending\""
        );
        let parsed: TransactionStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, TransactionStatus::Failed);
        assert!(serde_json::from_str::<TransactionStatus>("\"settled\"").is_err());
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "completed".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Completed
        );
        assert!("Pending".parse::<TransactionStatus>().is_err());
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(!TransactionStatus::Pending.is_terminal());
    }

    #[test]
    fn test_transaction_starts_pending() {
        let txn = Transaction::from_request(&TransactionRequest::new("A1", "A2", 10.0));
        assert_eq!(txn.status, TransactionStatus::Pending);
        assert_eq!(txn.from_account_id, "A1");
        assert_eq!(txn.to_account_id, "A2");
    }

    #[test]
    fn test_transaction_json_shape() {
        let mut txn = Transaction::from_request_at(
            &TransactionRequest::new("A1", "A2", 10.0),
            Timestamp::from_micros(1_700_000_000_000_000),
        );
        txn.id = TransactionId::from_string("abc");
        let json = serde_json::to_string(&txn).unwrap();
        assert_eq!(
            json,
            r#"{"id":"abc","from_account_id":"A1","to_account_id":"A2","amount":10.0,"at":"2023-11-14T22:13:20.000000Z","status":"pending"}"#
        );
    }

    #[test]
    fn test_request_rejects_unknown_fields() {
        let raw = r#"{"from_account_id":"A","to_account_id":"B","amount":1.0,"memo":"x"}"#;
        assert!(serde_json::from_str::<TransactionRequest>(raw).is_err());
    }

    #[test]
    fn test_filter_blank_means_all() {
        assert_eq!(TransactionFilter::from_account("   "), TransactionFilter::all());
        assert_eq!(
            TransactionFilter::from_account(" A1 ").from_account_id.as_deref(),
            Some("A1")
        );
    }

    #[test]
    fn test_filter_matches_source_account() {
        let txn = Transaction::from_request(&TransactionRequest::new("A1", "A2", 1.0));
        assert!(TransactionFilter::all().matches(&txn));
        assert!(TransactionFilter::from_account("A1").matches(&txn));
        assert!(!TransactionFilter::from_account("A2").matches(&txn));
    }

    #[test]
    fn test_fingerprint_hex() {
        let fp = Fingerprint::from_bytes([0xab; 32]);
        assert_eq!(fp.to_hex().len(), 64);
        assert!(fp.to_hex().starts_with("abab"));
    }

    proptest! {
        #[test]
        fn prop_sort_key_orders_by_time_then_id(a in 0u64..1000, b in 0u64..1000) {
            let req = TransactionRequest::new("A", "B", 1.0);
            let mut t1 = Transaction::from_request_at(&req, Timestamp::from_micros(a));
            let mut t2 = Transaction::from_request_at(&req, Timestamp::from_micros(b));
            t1.id = TransactionId::from_string("x");
            t2.id = TransactionId::from_string("y");
            prop_assert_eq!(t1.sort_key() < t2.sort_key(), a <= b);
        }
    }
}
