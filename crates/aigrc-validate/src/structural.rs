//! Step 3 of the validator: structural checks against the envelope schema.
//!
//! Works against the raw JSON value rather than the typed [`GovernanceEvent`]
//! so it can report one error per issue instead of deserde's first-failure
//! behavior, and so it can produce the specific `EVT_*` code each issue maps
//! to rather than a single generic schema error.

use aigrc_core::{EventErrorCode, ValidationError};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^evt_[0-9a-f]{32}$").unwrap())
}

fn schema_version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^aigrc-events@\d+\.\d+\.\d+$").unwrap())
}

fn hash_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^sha256:[0-9a-f]{64}$").unwrap())
}

const VALID_TYPES: &[&str] = &[
    "asset_discovered",
    "asset_registered",
    "asset_decommissioned",
    "asset_ownership_changed",
    "scan_started",
    "scan_completed",
    "scan_failed",
    "scan_finding_detected",
    "classification_assigned",
    "classification_changed",
    "classification_reviewed",
    "classification_disputed",
    "compliance_check_passed",
    "compliance_check_failed",
    "compliance_waiver_granted",
    "compliance_waiver_expired",
    "enforcement_blocked",
    "enforcement_allowed",
    "enforcement_quarantined",
    "enforcement_override_applied",
    "lifecycle_created",
    "lifecycle_updated",
    "lifecycle_retired",
    "lifecycle_archived",
    "policy_created",
    "policy_updated",
    "policy_deleted",
    "policy_violation_detected",
    "audit_access_logged",
    "audit_export_requested",
    "audit_review_completed",
];

pub fn check(input: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match input.get("id").and_then(Value::as_str) {
        Some(id) if id_pattern().is_match(id) => {}
        _ => errors.push(
            ValidationError::new(EventErrorCode::EvtIdInvalid, "id must match \"evt_\" + 32 lowercase hex chars")
                .with_field("id"),
        ),
    }

    match input.get("schemaVersion").and_then(Value::as_str) {
        Some(v) if schema_version_pattern().is_match(v) => {}
        _ => errors.push(
            ValidationError::new(
                EventErrorCode::EvtSchemaVersionUnknown,
                "schemaVersion must match \"aigrc-events@MAJOR.MINOR.PATCH\"",
            )
            .with_field("schemaVersion"),
        ),
    }

    match input.get("type").and_then(Value::as_str) {
        Some(t) if VALID_TYPES.contains(&t) => {}
        _ => errors.push(
            ValidationError::new(EventErrorCode::EvtTypeInvalid, "type is not one of the closed set of event types")
                .with_field("type"),
        ),
    }

    match input.get("goldenThread") {
        None => errors.push(
            ValidationError::new(EventErrorCode::EvtGoldenThreadMissing, "goldenThread is required")
                .with_field("goldenThread"),
        ),
        Some(gt) => {
            let tag = gt.get("type").and_then(Value::as_str);
            match tag {
                Some("linked") => {
                    for field in ["system", "ref", "url", "status"] {
                        if gt.get(field).and_then(Value::as_str).is_none() {
                            errors.push(
                                ValidationError::new(
                                    EventErrorCode::EvtGoldenThreadInvalid,
                                    format!("linked goldenThread missing field {field}"),
                                )
                                .with_field(format!("goldenThread.{field}")),
                            );
                        }
                    }
                }
                Some("orphan") => {
                    for field in ["reason", "declaredBy", "declaredAt", "remediationDeadline", "remediationNote"] {
                        if gt.get(field).is_none() {
                            errors.push(
                                ValidationError::new(
                                    EventErrorCode::EvtGoldenThreadInvalid,
                                    format!("orphan goldenThread missing field {field}"),
                                )
                                .with_field(format!("goldenThread.{field}")),
                            );
                        }
                    }
                }
                _ => errors.push(
                    ValidationError::new(EventErrorCode::EvtGoldenThreadInvalid, "goldenThread.type must be \"linked\" or \"orphan\"")
                        .with_field("goldenThread.type"),
                ),
            }
        }
    }

    match input.get("hash").and_then(Value::as_str) {
        None => errors.push(ValidationError::new(EventErrorCode::EvtHashMissing, "hash is required").with_field("hash")),
        Some(h) if hash_pattern().is_match(h) => {}
        Some(_) => errors.push(
            ValidationError::new(EventErrorCode::EvtHashFormat, "hash must match \"sha256:\" + 64 hex chars").with_field("hash"),
        ),
    }

    match input.get("data") {
        Some(Value::Object(map)) if !map.is_empty() => {}
        _ => errors.push(ValidationError::new(EventErrorCode::EvtDataEmpty, "data must be an object with at least one entry").with_field("data")),
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_missing_hash() {
        let v = json!({"id": "evt_00000000000000000000000000000000", "schemaVersion": "aigrc-events@1.0.0", "type": "asset_discovered", "goldenThread": {"type": "linked", "system": "jira", "ref": "X", "url": "u", "status": "active"}, "data": {"a": 1}});
        let errors = check(&v);
        assert!(errors.iter().any(|e| e.code == EventErrorCode::EvtHashMissing));
    }

    #[test]
    fn flags_bad_hash_format() {
        let v = json!({"id": "evt_00000000000000000000000000000000", "schemaVersion": "aigrc-events@1.0.0", "type": "asset_discovered", "goldenThread": {"type": "linked", "system": "jira", "ref": "X", "url": "u", "status": "active"}, "hash": "not-a-hash", "data": {"a": 1}});
        let errors = check(&v);
        assert!(errors.iter().any(|e| e.code == EventErrorCode::EvtHashFormat));
    }

    #[test]
    fn accepts_well_formed_structure() {
        let v = json!({
            "id": "evt_0123456789abcdef0123456789abcdef",
            "schemaVersion": "aigrc-events@1.0.0",
            "type": "asset_discovered",
            "goldenThread": {"type": "linked", "system": "jira", "ref": "X", "url": "u", "status": "active"},
            "hash": format!("sha256:{}", "a".repeat(64)),
            "data": {"a": 1}
        });
        assert!(check(&v).is_empty());
    }
}
