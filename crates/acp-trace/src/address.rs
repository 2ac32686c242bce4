//! Content addressing for external state and diff artifacts.
//!
//! A content address is `sha256:` followed by the lowercase hex digest of
//! the value's compact JSON encoding. The value is first converted to a
//! `serde_json::Value`, whose maps keep keys sorted, so equal values always
//! produce equal addresses even when they come from unordered maps.

use serde::Serialize;
use sha2::{Digest, Sha256};

use acp_contracts::error::{TraceError, TraceResult};

/// Scheme prefix carried by every address this module produces.
pub const ADDRESS_PREFIX: &str = "sha256:";

/// Compute the content address of `value`, suitable for `state_ref` or `diff_ref`.
pub fn content_address<T: Serialize + ?Sized>(value: &T) -> TraceResult<String> {
    let canonical = serde_json::to_value(value).map_err(|e| TraceError::Serialization {
        reason: format!("content address input: {}", e),
    })?;
    let bytes = serde_json::to_vec(&canonical).map_err(|e| TraceError::Serialization {
        reason: format!("content address input: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);

    Ok(format!("{}{}", ADDRESS_PREFIX, hex::encode(hasher.finalize())))
}

/// Return true if `reference` has the shape of an address from `content_address`.
pub fn is_content_address(reference: &str) -> bool {
    reference
        .strip_prefix(ADDRESS_PREFIX)
        .map(|digest| {
            digest.len() == 64
                && digest
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        })
        .unwrap_or(false)
}
