//! Create-request validation.
//!
//! Runs before fingerprinting and before any key lock is taken, so two
//! requests that differ only in an invalid value never reach the cache.

use tally_core::{TallyError, TallyResult, TransactionRequest};

/// Validate a create request and return its normalized form.
///
/// Normalization trims account ids. Every offending field is reported:
/// `"invalid or missing: from_account_id, amount"`.
///
/// Rules:
/// - `from_account_id` non-blank
/// - `to_account_id` non-blank and different from `from_account_id`
/// - `amount` finite and strictly positive
pub fn validate_request(request: &TransactionRequest) -> TallyResult<TransactionRequest> {
    let from = request.from_account_id.trim();
    let to = request.to_account_id.trim();
    let mut invalid = Vec::new();

    if from.is_empty() {
        invalid.push("from_account_id");
    }
    if to.is_empty() || to == from {
        invalid.push("to_account_id");
    }
    if !request.amount.is_finite() || request.amount <= 0.0 {
        invalid.push("amount");
    }

    if !invalid.is_empty() {
        return Err(TallyError::validation(format!(
            "invalid or missing: {}",
            invalid.join(", ")
        )));
    }

    Ok(TransactionRequest::new(from, to, request.amount))
}
