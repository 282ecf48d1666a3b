//! SHA-256 hashing over canonical bytes, with constant-time verification.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const HASH_PREFIX: &str = "sha256:";

#[derive(Debug, Error)]
pub enum HashError {
    #[error("EVT_HASH_FORMAT: expected \"sha256:\" prefix followed by 64 hex chars")]
    BadFormat,
    #[error("EVT_HASH_FORMAT: hash is not valid hex: {0}")]
    BadHex(#[from] hex::FromHexError),
}

/// Result of verifying a declared hash against a recomputed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub verified: bool,
    pub computed: String,
    pub expected: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `hash(canonicalBytes) = "sha256:" + lowercase_hex(SHA256(canonicalBytes))`.
pub fn hash(canonical_bytes: &[u8]) -> String {
    let digest = Sha256::digest(canonical_bytes);
    format!("{HASH_PREFIX}{}", hex::encode(digest))
}

/// Parses `"sha256:" + 64 hex chars"` into its raw 32-byte digest, rejecting
/// anything else as `EVT_HASH_FORMAT`.
pub fn parse_hash(declared: &str) -> Result<[u8; 32], HashError> {
    let hex_part = declared.strip_prefix(HASH_PREFIX).ok_or(HashError::BadFormat)?;
    if hex_part.len() != 64 {
        return Err(HashError::BadFormat);
    }
    let bytes = hex::decode(hex_part)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Compares a declared hash against bytes recomputed from the canonical form,
/// using a length-constant-time byte comparison so a timing side channel
/// can't leak how many leading bytes matched.
pub fn verify(declared: &str, canonical_bytes: &[u8]) -> VerifyResult {
    let computed = hash(canonical_bytes);

    let declared_digest = parse_hash(declared);
    let computed_digest = parse_hash(&computed).expect("computed hash is always well-formed");

    let verified = match declared_digest {
        Ok(d) => bool::from(d.ct_eq(&computed_digest)),
        Err(_) => false,
    };

    VerifyResult {
        verified,
        computed,
        expected: declared.to_string(),
        reason: if verified {
            None
        } else if declared_digest.is_err() {
            Some("EVT_HASH_FORMAT".to_string())
        } else {
            Some("hash mismatch".to_string())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_has_expected_shape() {
        let h = hash(b"hello");
        assert!(h.starts_with("sha256:"));
        assert_eq!(h.len(), 7 + 64);
    }

    #[test]
    fn verify_accepts_matching_hash() {
        let bytes = b"canonical-bytes";
        let h = hash(bytes);
        let result = verify(&h, bytes);
        assert!(result.verified);
        assert!(result.reason.is_none());
    }

    #[test]
    fn verify_rejects_tampered_bytes() {
        let bytes = b"canonical-bytes";
        let h = hash(bytes);
        let result = verify(&h, b"canonical-bytes-tampered");
        assert!(!result.verified);
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        let result = verify("not-a-hash", b"anything");
        assert!(!result.verified);
        assert!(result.reason.is_some());
    }

    #[test]
    fn parse_hash_rejects_wrong_length() {
        assert!(parse_hash("sha256:abcd").is_err());
    }
}
