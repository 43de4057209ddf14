//! Request fingerprinting
//!
//! The fingerprint is SHA-256 over the canonical JSON encoding of the
//! normalized request. `TransactionRequest` is a plain struct, so serde emits
//! its fields in declaration order and the encoding is stable: logically
//! identical payloads always hash identically. The idempotency key is not
//! part of the payload.

use sha2::{Digest, Sha256};
use tally_core::{Fingerprint, TallyError, TallyResult, TransactionRequest};

/// Compute the fingerprint of a validated, normalized request
///
/// # Errors
///
/// `Serialization` if the request cannot be encoded.
pub fn fingerprint(request: &TransactionRequest) -> TallyResult<Fingerprint> {
    let canonical =
        serde_json::to_vec(request).map_err(|e| TallyError::Serialization(e.to_string()))?;
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(&canonical));
    Ok(Fingerprint::from_bytes(digest))
}
