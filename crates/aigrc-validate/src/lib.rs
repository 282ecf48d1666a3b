//! Multi-step validation pipeline for incoming governance events.
//!
//! Runs in strict order and accumulates errors rather than short-circuiting,
//! except where later checks genuinely depend on structural validity (a
//! category-vs-type check is meaningless if `type` itself didn't parse).

use aigrc_core::event::GovernanceEvent;
use aigrc_core::{canon::Canonicalizer, hash, EventErrorCode, ValidationError};
use serde_json::Value;

mod structural;

/// Outcome of running the full pipeline: either the event is valid, or the
/// complete list of accumulated errors is returned — never a single error
/// standing in for the whole bag.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Vec<ValidationError>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::Valid => &[],
            Self::Invalid(errors) => errors,
        }
    }
}

/// Runs the pipeline against a raw, untyped JSON payload (as received on the
/// wire, before it is trusted to be a `GovernanceEvent`).
pub fn validate(input: &Value) -> ValidationOutcome {
    // Step 1: object guard.
    let Value::Object(_) = input else {
        return ValidationOutcome::Invalid(vec![ValidationError::new(
            EventErrorCode::EvtIdInvalid,
            "input is not a JSON object",
        )]);
    };

    // Step 2: receivedAt must be absent on ingress.
    let mut errors = Vec::new();
    if input.get("receivedAt").is_some() {
        errors.push(ValidationError::new(
            EventErrorCode::EvtReceivedAtRejected,
            "receivedAt is server-assigned and must not be set by the producer",
        ));
    }

    // Step 3: structural check. Halts further checks on failure.
    let structural_errors = structural::check(input);
    if !structural_errors.is_empty() {
        errors.extend(structural_errors);
        return ValidationOutcome::Invalid(errors);
    }
    if !errors.is_empty() {
        // receivedAt was rejected but the envelope is otherwise structurally
        // sound; still halt before semantic checks since the producer must
        // resubmit without that field.
        return ValidationOutcome::Invalid(errors);
    }

    let event: GovernanceEvent = match serde_json::from_value(input.clone()) {
        Ok(e) => e,
        Err(e) => {
            return ValidationOutcome::Invalid(vec![ValidationError::new(
                EventErrorCode::EvtSchemaInvalid,
                format!("envelope did not deserialize: {e}"),
            )])
        }
    };

    // Step 4: category vs type.
    if event.category != event.expected_category() {
        errors.push(ValidationError::new(
            EventErrorCode::EvtCategoryMismatch,
            format!(
                "category {:?} does not match CATEGORY_OF(type) {:?}",
                event.category,
                event.expected_category()
            ),
        ).with_field("category"));
    }

    // Step 5: orphan remediationNote length.
    if !event.golden_thread.is_orphan_note_valid() {
        errors.push(
            ValidationError::new(
                EventErrorCode::EvtOrphanNoteTooShort,
                "orphan remediationNote must be at least 10 characters",
            )
            .with_field("goldenThread.remediationNote"),
        );
    }

    // Step 6: hash integrity.
    let canon = Canonicalizer::default();
    let canonical_bytes = serde_json::to_value(&event)
        .ok()
        .and_then(|v| canon.canonicalize(&v).ok());
    match canonical_bytes {
        Some(bytes) => {
            let result = hash::verify(&event.hash, &bytes);
            if !result.verified {
                errors.push(
                    ValidationError::new(EventErrorCode::EvtHashInvalid, "declared hash does not match recomputed hash")
                        .with_field("hash"),
                );
            }
        }
        None => {
            errors.push(ValidationError::new(EventErrorCode::EvtInternal, "failed to canonicalize event for hash verification"));
        }
    }

    if errors.is_empty() {
        ValidationOutcome::Valid
    } else {
        ValidationOutcome::Invalid(errors)
    }
}

/// Validates and returns the parsed event, or fails with the first
/// accumulated error.
pub fn validate_or_throw(input: &Value) -> Result<GovernanceEvent, ValidationError> {
    match validate(input) {
        ValidationOutcome::Valid => serde_json::from_value(input.clone())
            .map_err(|e| ValidationError::new(EventErrorCode::EvtSchemaInvalid, e.to_string())),
        ValidationOutcome::Invalid(mut errors) => Err(errors.remove(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_event_json() -> Value {
        let source = aigrc_core::EventSource {
            tool: "scanner".into(),
            tool_version: "1.0.0".into(),
            org_id: "org-pangolabs".into(),
            instance_id: "inst-1".into(),
            identity: aigrc_core::SourceIdentity { identity_type: "service".into(), subject: "svc".into() },
            environment: "production".into(),
        };
        let mut data = std::collections::BTreeMap::new();
        data.insert("assetName".to_string(), json!("model-a"));

        let golden_thread = aigrc_core::GoldenThread::Linked {
            system: "jira".into(),
            reference: "FIN-1234".into(),
            url: "https://jira.example.com/FIN-1234".into(),
            status: aigrc_core::GoldenThreadStatus::Active,
            verified_at: None,
        };

        let event = aigrc_core::EventBuilder::new(
            "aigrc-events@1.0.0",
            source,
            "asset-1",
            chrono::Utc::now(),
            golden_thread,
            data,
        )
        .asset(
            aigrc_core::AssetEventType::Discovered,
            aigrc_core::SourceProfile::Standard(aigrc_core::StandardSource {
                org_id: "org-pangolabs",
                tool: "scanner",
                event_type: "asset.discovered",
                asset_id: "asset-1",
                produced_at: chrono::Utc::now(),
            }),
        )
        .unwrap();

        serde_json::to_value(&event).unwrap()
    }

    #[test]
    fn accepts_a_well_formed_event() {
        let outcome = validate(&valid_event_json());
        assert!(outcome.is_valid(), "{:?}", outcome.errors());
    }

    #[test]
    fn rejects_received_at_on_ingress() {
        let mut value = valid_event_json();
        value["receivedAt"] = json!("2025-01-01T00:00:00Z");
        let outcome = validate(&value);
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors()[0].code, EventErrorCode::EvtReceivedAtRejected);
    }

    #[test]
    fn rejects_non_object_input() {
        let outcome = validate(&json!([1, 2, 3]));
        assert!(!outcome.is_valid());
        assert_eq!(outcome.errors()[0].code, EventErrorCode::EvtIdInvalid);
    }

    #[test]
    fn rejects_category_mismatch() {
        let mut value = valid_event_json();
        value["category"] = json!("scan");
        let outcome = validate(&value);
        assert!(!outcome.is_valid());
        assert!(outcome.errors().iter().any(|e| e.code == EventErrorCode::EvtCategoryMismatch));
    }

    #[test]
    fn rejects_tampered_hash() {
        let mut value = valid_event_json();
        value["assetId"] = json!("tampered-asset");
        let outcome = validate(&value);
        assert!(!outcome.is_valid());
        assert!(outcome.errors().iter().any(|e| e.code == EventErrorCode::EvtHashInvalid));
    }

    #[test]
    fn rejects_data_empty() {
        let mut value = valid_event_json();
        value["data"] = json!({});
        let outcome = validate(&value);
        assert!(!outcome.is_valid());
        assert!(outcome.errors().iter().any(|e| e.code == EventErrorCode::EvtDataEmpty));
    }

    #[test]
    fn validate_or_throw_returns_first_error() {
        let mut value = valid_event_json();
        value["data"] = json!({});
        let err = validate_or_throw(&value).unwrap_err();
        assert_eq!(err.code, EventErrorCode::EvtDataEmpty);
    }
}
