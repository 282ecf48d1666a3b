//! Golden Thread: the accountability linkage back to a business authorization.
//!
//! Two shapes: `linked` (an active reference into an external system) or
//! `orphan` (an explicit declaration with a remediation plan). Both are
//! carried on the envelope as a single tagged `GoldenThread` enum — never a
//! struct with optional fields — per the discriminated-union guidance in the
//! design notes.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Signature algorithms accepted on a Golden Thread's `"{ALG}:{BASE64}"` signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
    #[serde(rename = "RSA-SHA256")]
    RsaSha256,
    #[serde(rename = "ECDSA-P256")]
    EcdsaP256,
}

impl SignatureAlgorithm {
    fn as_str(&self) -> &'static str {
        match self {
            Self::RsaSha256 => "RSA-SHA256",
            Self::EcdsaP256 => "ECDSA-P256",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "RSA-SHA256" => Some(Self::RsaSha256),
            "ECDSA-P256" => Some(Self::EcdsaP256),
            _ => None,
        }
    }
}

/// A parsed `"{ALG}:{BASE64}"` Golden Thread signature.
#[derive(Debug, Clone)]
pub struct ParsedSignature {
    pub algorithm: SignatureAlgorithm,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum GoldenThreadError {
    #[error("EVT_SIGNATURE_INVALID: malformed signature, expected \"ALG:BASE64\"")]
    MalformedSignature,
    #[error("EVT_SIGNATURE_INVALID: unknown algorithm {0:?}")]
    UnknownAlgorithm(String),
    #[error("EVT_SIGNATURE_INVALID: base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("EVT_SIGNATURE_INVALID: public key could not be imported")]
    KeyImport,
    #[error("EVT_SIGNATURE_INVALID: algorithm mismatch between signature and provided key")]
    AlgorithmMismatch,
    #[error("EVT_SIGNATURE_INVALID: signature does not verify")]
    VerificationFailed,
}

/// The Golden Thread's hash-input components, sorted by key per §4.C4.
#[derive(Debug, Clone)]
pub struct GoldenThreadComponents {
    pub ticket_id: String,
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
}

impl GoldenThreadComponents {
    /// `"approved_at=" + isoUtcZ(approved_at) + "|approved_by=" + approved_by + "|ticket_id=" + ticket_id`
    ///
    /// Timestamp normalization strips sub-second fractions to `…Z`.
    pub fn canonical_string(&self) -> String {
        let normalized = self.approved_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        format!(
            "approved_at={}|approved_by={}|ticket_id={}",
            normalized, self.approved_by, self.ticket_id
        )
    }

    pub fn hash(&self) -> String {
        let canonical = self.canonical_string();
        let digest = Sha256::digest(canonical.as_bytes());
        format!("sha256:{}", hex::encode(digest))
    }
}

/// Parses the `"{ALG}:{BASE64}"` signature format.
pub fn parse_signature(raw: &str) -> Result<ParsedSignature, GoldenThreadError> {
    let (alg_str, b64) = raw.split_once(':').ok_or(GoldenThreadError::MalformedSignature)?;
    let algorithm = SignatureAlgorithm::parse(alg_str)
        .ok_or_else(|| GoldenThreadError::UnknownAlgorithm(alg_str.to_string()))?;
    let bytes = STANDARD.decode(b64)?;
    Ok(ParsedSignature { algorithm, bytes })
}

/// A public key imported for Golden Thread signature verification, tagged
/// with the algorithm it is meant to verify.
#[derive(Debug, Clone)]
pub struct GoldenThreadPublicKey {
    pub algorithm: SignatureAlgorithm,
    pub der_bytes: Vec<u8>,
}

/// Imports a PEM-encoded public key (`-----BEGIN PUBLIC KEY-----` ...)
/// appropriate to `algorithm`, decoding the body to its raw DER/SPKI bytes.
///
/// Returns `GoldenThreadError::KeyImport` if the PEM framing is missing or
/// the body does not base64-decode — distinct from a verification failure,
/// which can only occur once a key has actually been imported.
pub fn import_public_key_pem(
    pem: &str,
    algorithm: SignatureAlgorithm,
) -> Result<GoldenThreadPublicKey, GoldenThreadError> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    if body.is_empty() {
        return Err(GoldenThreadError::KeyImport);
    }
    let der_bytes = STANDARD.decode(body).map_err(|_| GoldenThreadError::KeyImport)?;
    Ok(GoldenThreadPublicKey { algorithm, der_bytes })
}

/// Verifies a Golden Thread signature over its canonical string against an
/// imported public key.
///
/// Reports `AlgorithmMismatch` when the signature's declared algorithm
/// doesn't match the key's algorithm, and `VerificationFailed` only once
/// both have agreed and the cryptographic check itself fails — the two are
/// kept as distinct failure reasons rather than collapsed.
pub fn verify_signature(
    signature: &ParsedSignature,
    canonical_string: &str,
    key: &GoldenThreadPublicKey,
) -> Result<(), GoldenThreadError> {
    use ring::signature;

    if signature.algorithm != key.algorithm {
        return Err(GoldenThreadError::AlgorithmMismatch);
    }

    let algorithm: &dyn signature::VerificationAlgorithm = match key.algorithm {
        SignatureAlgorithm::RsaSha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
        SignatureAlgorithm::EcdsaP256 => &signature::ECDSA_P256_SHA256_ASN1,
    };

    let verifier = signature::UnparsedPublicKey::new(algorithm, &key.der_bytes);
    verifier
        .verify(canonical_string.as_bytes(), &signature.bytes)
        .map_err(|_| GoldenThreadError::VerificationFailed)
}

/// Tagged Golden Thread variant carried on the envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GoldenThread {
    Linked {
        system: String,
        #[serde(rename = "ref")]
        reference: String,
        url: String,
        status: GoldenThreadStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        verified_at: Option<DateTime<Utc>>,
    },
    Orphan {
        reason: String,
        declared_by: String,
        declared_at: DateTime<Utc>,
        remediation_deadline: DateTime<Utc>,
        remediation_note: String,
    },
}

/// Golden Thread lifecycle status. The validator accepts any of these values
/// without inferring transitions between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoldenThreadStatus {
    Active,
    Completed,
    Cancelled,
    Unknown,
}

/// Minimum length of an orphan's `remediationNote`, per the boundary behavior
/// in §8 (length 9 rejected, length 10 accepted).
pub const MIN_REMEDIATION_NOTE_LEN: usize = 10;

impl GoldenThread {
    pub fn is_orphan_note_valid(&self) -> bool {
        match self {
            Self::Orphan { remediation_note, .. } => {
                remediation_note.chars().count() >= MIN_REMEDIATION_NOTE_LEN
            }
            Self::Linked { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn golden_thread_hash_test_vector() {
        let components = GoldenThreadComponents {
            ticket_id: "FIN-1234".to_string(),
            approved_by: "ciso@corp.com".to_string(),
            approved_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap(),
        };
        assert_eq!(
            components.canonical_string(),
            "approved_at=2025-01-15T10:30:00Z|approved_by=ciso@corp.com|ticket_id=FIN-1234"
        );
        assert_eq!(
            components.hash(),
            "sha256:7d865e959b2466918c9863afca942d0fb89d7c9ac0c99bafc3749504ded97730"
        );
    }

    #[test]
    fn strips_subsecond_fractions() {
        let components = GoldenThreadComponents {
            ticket_id: "T-1".to_string(),
            approved_by: "a@b.com".to_string(),
            approved_at: Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap() + chrono::Duration::milliseconds(500),
        };
        assert!(components.canonical_string().ends_with("Z|approved_by=a@b.com|ticket_id=T-1"));
        assert!(!components.canonical_string().contains('.'));
    }

    #[test]
    fn parse_signature_rejects_unknown_algorithm() {
        let raw = "DSA-SHA1:AAAA";
        assert!(matches!(
            parse_signature(raw),
            Err(GoldenThreadError::UnknownAlgorithm(_))
        ));
    }

    #[test]
    fn parse_signature_rejects_malformed_input() {
        assert!(matches!(
            parse_signature("no-colon-here"),
            Err(GoldenThreadError::MalformedSignature)
        ));
    }

    #[test]
    fn import_public_key_pem_rejects_missing_framing() {
        assert!(matches!(
            import_public_key_pem("not a pem at all", SignatureAlgorithm::EcdsaP256),
            Err(GoldenThreadError::KeyImport)
        ));
    }

    #[test]
    fn import_public_key_pem_rejects_bad_base64() {
        let pem = "-----BEGIN PUBLIC KEY-----\nnot-base64!!!\n-----END PUBLIC KEY-----\n";
        assert!(matches!(
            import_public_key_pem(pem, SignatureAlgorithm::EcdsaP256),
            Err(GoldenThreadError::KeyImport)
        ));
    }

    #[test]
    fn verify_signature_reports_algorithm_mismatch_distinctly() {
        let signature = ParsedSignature {
            algorithm: SignatureAlgorithm::RsaSha256,
            bytes: vec![0u8; 8],
        };
        let key = GoldenThreadPublicKey {
            algorithm: SignatureAlgorithm::EcdsaP256,
            der_bytes: vec![0u8; 65],
        };
        assert!(matches!(
            verify_signature(&signature, "irrelevant", &key),
            Err(GoldenThreadError::AlgorithmMismatch)
        ));
    }

    #[test]
    fn verify_signature_reports_verification_failure_once_algorithms_agree() {
        let signature = ParsedSignature {
            algorithm: SignatureAlgorithm::EcdsaP256,
            bytes: vec![0u8; 8],
        };
        let key = GoldenThreadPublicKey {
            algorithm: SignatureAlgorithm::EcdsaP256,
            der_bytes: vec![0u8; 65],
        };
        assert!(matches!(
            verify_signature(&signature, "irrelevant", &key),
            Err(GoldenThreadError::VerificationFailed)
        ));
    }

    fn orphan_with_note(note: &str) -> GoldenThread {
        GoldenThread::Orphan {
            reason: "r".into(),
            declared_by: "d".into(),
            declared_at: Utc::now(),
            remediation_deadline: Utc::now(),
            remediation_note: note.into(),
        }
    }

    #[test]
    fn orphan_note_length_boundary() {
        assert!(!orphan_with_note("123456789").is_orphan_note_valid());
        assert!(orphan_with_note("1234567890").is_orphan_note_valid());
    }
}
