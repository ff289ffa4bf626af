//! # Canonical Digests — Tamper-Evident Ledger Rows
//!
//! Every ledger row carries a SHA-256 digest of its own content, computed
//! over RFC 8785 (JCS) canonical bytes. Canonicalization makes the digest a
//! function of the row's values only: field order at the serialization site,
//! whitespace, and escaping differences cannot change it.
//!
//! [`CanonicalBytes`] has a private inner field; the only constructor runs
//! the JCS serializer. Any function that hashes row content takes
//! `&CanonicalBytes`, so a digest over non-canonical bytes cannot be
//! produced by accident.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::MovementError;

/// Bytes produced exclusively by JCS canonicalization (RFC 8785): sorted
/// keys, compact separators, deterministic number rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::Infrastructure`] if JCS serialization fails.
    /// Row types in this stack are plain structs of strings, integers, and
    /// options; a failure here indicates a programming error, not bad input.
    pub fn new(obj: &impl Serialize) -> Result<Self, MovementError> {
        let s = serde_jcs::to_string(obj).map_err(|e| {
            MovementError::Infrastructure(format!("canonical serialization failed: {e}"))
        })?;
        Ok(Self(s.into_bytes()))
    }

    /// The canonical byte form, ready for hashing.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Compute a lowercase SHA-256 hex digest from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, not raw `&[u8]`, so every digest in the
/// stack flows through the same canonicalization path.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    let hash = Sha256::digest(data.as_bytes());
    hash.iter().map(|b| format!("{b:02x}")).collect()
}
