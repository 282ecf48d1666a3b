//! Deterministic JSON canonicalization with sorted keys and field exclusion.
//!
//! Two semantically equal events, regardless of how their keys were ordered
//! in memory, must canonicalize to the same byte sequence. `serde_jcs`
//! already implements RFC 8785 (sorted keys, shortest-round-trip numerics, no
//! insignificant whitespace) over any `Serialize` value, so exclusion is the
//! only piece this module adds on top.

use serde_json::Value;
use thiserror::Error;

/// Default keys stripped before canonicalization: never part of the hash input.
pub const DEFAULT_EXCLUDED_KEYS: &[&str] = &["hash", "signature", "receivedAt"];

#[derive(Debug, Error)]
pub enum CanonError {
    #[error("value is not a JSON object")]
    NotAnObject,
    #[error("ENCODE_ERROR: {0}")]
    Encode(String),
}

/// Produces the canonical byte form of a JSON object, excluding a configurable
/// set of top-level keys.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    excluded_keys: Vec<String>,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_KEYS.iter().map(|s| s.to_string()).collect())
    }
}

impl Canonicalizer {
    pub fn new(excluded_keys: Vec<String>) -> Self {
        Self { excluded_keys }
    }

    /// Remove the excluded keys from a top-level object, then emit the
    /// compact, sorted-key, UTF-8 canonical form.
    pub fn canonicalize(&self, value: &Value) -> Result<Vec<u8>, CanonError> {
        let Value::Object(map) = value else {
            return Err(CanonError::NotAnObject);
        };

        let mut stripped = map.clone();
        for key in &self.excluded_keys {
            stripped.remove(key);
        }

        serde_jcs::to_vec(&Value::Object(stripped)).map_err(|e| CanonError::Encode(e.to_string()))
    }

    /// Like [`Canonicalizer::canonicalize`] but returns the canonical bytes as a `String`.
    pub fn canonicalize_string(&self, value: &Value) -> Result<String, CanonError> {
        let bytes = self.canonicalize(value)?;
        String::from_utf8(bytes).map_err(|e| CanonError::Encode(e.to_string()))
    }
}
