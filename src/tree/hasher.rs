//! Fingerprint computation for file content
//!
//! The code host reports MD5 hex digests in listings and `ETag` headers, so
//! local fingerprints use the same digest to compare equal.

use crate::types::Fingerprint;
use md5::{Digest, Md5};

/// Compute the fingerprint of file bytes
///
/// Fingerprint = hex(MD5(content))
pub fn compute_fingerprint(content: &[u8]) -> Fingerprint {
    let mut hasher = Md5::new();
    hasher.update(content);
    Fingerprint::new(hex::encode(hasher.finalize()))
}
