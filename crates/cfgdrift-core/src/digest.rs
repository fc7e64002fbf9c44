//! Digest computation for trees and secret values.
//!
//! ## Digest Types
//!
//! - **Node digest**: SHA-256 of the canonical JSON encoding of a subtree.
//!   Used as the content half of a [`TreeIdentity`](crate::model::TreeIdentity).
//! - **Secret fingerprint**: short SHA-256 prefix standing in for a sensitive
//!   scalar, so a changed secret still shows up as a change.
//!
//! ## Determinism Guarantees
//!
//! - Keyed maps serialize in key order (`BTreeMap`) and unordered sets are
//!   stored sorted, so equal trees always encode to equal bytes.
//! - Ordered lists keep their order: reordering changes the digest.

use cfgdrift_core_types::Sensitive;
use sha2::{Digest, Sha256};

use crate::errors::Result;
use crate::model::ConfigNode;

/// Number of hex characters kept in a secret fingerprint
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Prefix marking a fingerprinted scalar
pub const FINGERPRINT_PREFIX: &str = "sha256:";

/// Compute the digest of a subtree.
///
/// Returns a hex-encoded SHA-256 digest (64 characters).
///
/// # Errors
///
/// Returns `DriftError::Serialization` if JSON serialization fails.
pub fn compute_node_digest(node: &ConfigNode) -> Result<String> {
    let canonical = serde_json::to_string(node)?;
    Ok(hash_string(&canonical))
}

/// Replace a secret with `sha256:<16 hex>`.
///
/// ```
/// use cfgdrift_core::digest::fingerprint_secret;
/// use cfgdrift_core_types::Sensitive;
///
/// let fp = fingerprint_secret(&Sensitive::new("public".to_string()));
/// assert!(fp.starts_with("sha256:"));
/// assert_eq!(fp.len(), 7 + 16);
/// ```
pub fn fingerprint_secret(secret: &Sensitive<String>) -> String {
    let digest = hash_string(secret.expose());
    format!("{}{}", FINGERPRINT_PREFIX, &digest[..FINGERPRINT_HEX_LEN])
}

fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
