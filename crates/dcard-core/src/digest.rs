//! # Payload Digest
//!
//! SHA-256 over `CanonicalBytes`. Used to identify a card payload in logs
//! and degradation reports without writing any personal data.

use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A SHA-256 digest of canonical payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of canonical payload bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    ContentDigest {
        bytes: hasher.finalize().into(),
    }
}
