//! The closed `EVT_*` error taxonomy shared by every layer of the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of wire-level error codes.
///
/// Every validation, identity, or storage failure that reaches a producer is
/// expressed as one of these variants — never a free-form string — so the
/// contract can't drift between the validator, the store, and the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventErrorCode {
    EvtIdInvalid,
    EvtSchemaInvalid,
    EvtSchemaVersionUnknown,
    EvtTypeInvalid,
    EvtCategoryMismatch,
    EvtGoldenThreadMissing,
    EvtGoldenThreadInvalid,
    EvtOrphanNoteTooShort,
    EvtHashMissing,
    EvtHashInvalid,
    EvtHashFormat,
    EvtSignatureInvalid,
    EvtReceivedAtRejected,
    EvtDataEmpty,
    EvtDuplicate,
    EvtRateLimited,
    EvtOrgMismatch,
    EvtBatchTooLarge,
    EvtInternal,
}

impl EventErrorCode {
    /// The wire string for this code, e.g. `"EVT_ORG_MISMATCH"`.
    ///
    /// `EVT_RECEIVED_AT_REJECTED` and `EVT_RECEIVED_AT_SET` are aliases in the
    /// external contract (see Open Questions); this implementation emits the
    /// former as the single stable wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EvtIdInvalid => "EVT_ID_INVALID",
            Self::EvtSchemaInvalid => "EVT_SCHEMA_INVALID",
            Self::EvtSchemaVersionUnknown => "EVT_SCHEMA_VERSION_UNKNOWN",
            Self::EvtTypeInvalid => "EVT_TYPE_INVALID",
            Self::EvtCategoryMismatch => "EVT_CATEGORY_MISMATCH",
            Self::EvtGoldenThreadMissing => "EVT_GOLDEN_THREAD_MISSING",
            Self::EvtGoldenThreadInvalid => "EVT_GOLDEN_THREAD_INVALID",
            Self::EvtOrphanNoteTooShort => "EVT_ORPHAN_NOTE_TOO_SHORT",
            Self::EvtHashMissing => "EVT_HASH_MISSING",
            Self::EvtHashInvalid => "EVT_HASH_INVALID",
            Self::EvtHashFormat => "EVT_HASH_FORMAT",
            Self::EvtSignatureInvalid => "EVT_SIGNATURE_INVALID",
            Self::EvtReceivedAtRejected => "EVT_RECEIVED_AT_REJECTED",
            Self::EvtDataEmpty => "EVT_DATA_EMPTY",
            Self::EvtDuplicate => "EVT_DUPLICATE",
            Self::EvtRateLimited => "EVT_RATE_LIMITED",
            Self::EvtOrgMismatch => "EVT_ORG_MISMATCH",
            Self::EvtBatchTooLarge => "EVT_BATCH_TOO_LARGE",
            Self::EvtInternal => "EVT_INTERNAL",
        }
    }
}

impl fmt::Display for EventErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single coded validation failure, optionally pinned to a field or schema path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: EventErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_path: Option<String>,
}

impl ValidationError {
    pub fn new(code: EventErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            schema_path: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_schema_path(mut self, path: impl Into<String>) -> Self {
        self.schema_path = Some(path.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    /// The serialized wire form must match `as_str()` exactly — this is what
    /// keeps `results[i].error.code` in a batch response on the same closed
    /// `EVT_*` vocabulary as the sync path's `ErrorDetail`.
    #[test]
    fn serialized_form_matches_as_str_for_every_variant() {
        let codes = [
            EventErrorCode::EvtIdInvalid,
            EventErrorCode::EvtSchemaInvalid,
            EventErrorCode::EvtSchemaVersionUnknown,
            EventErrorCode::EvtTypeInvalid,
            EventErrorCode::EvtCategoryMismatch,
            EventErrorCode::EvtGoldenThreadMissing,
            EventErrorCode::EvtGoldenThreadInvalid,
            EventErrorCode::EvtOrphanNoteTooShort,
            EventErrorCode::EvtHashMissing,
            EventErrorCode::EvtHashInvalid,
            EventErrorCode::EvtHashFormat,
            EventErrorCode::EvtSignatureInvalid,
            EventErrorCode::EvtReceivedAtRejected,
            EventErrorCode::EvtDataEmpty,
            EventErrorCode::EvtDuplicate,
            EventErrorCode::EvtRateLimited,
            EventErrorCode::EvtOrgMismatch,
            EventErrorCode::EvtBatchTooLarge,
            EventErrorCode::EvtInternal,
        ];
        for code in codes {
            let serialized = serde_json::to_string(&code).unwrap();
            assert_eq!(serialized, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn deserializes_from_its_own_wire_form() {
        let value: EventErrorCode = serde_json::from_str("\"EVT_ORG_MISMATCH\"").unwrap();
        assert_eq!(value, EventErrorCode::EvtOrgMismatch);
    }
}
