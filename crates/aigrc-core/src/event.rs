//! The `GovernanceEvent` envelope, its closed `type`/`category` tables, and
//! the tagged variants used throughout the pipeline.

use crate::golden_thread::GoldenThread;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fixed envelope spec version. Every event on the wire carries this literal.
pub const SPEC_VERSION: &str = "1.0";

/// The 8 closed governance categories. Every [`EventType`] maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Asset,
    Scan,
    Classification,
    Compliance,
    Enforcement,
    Lifecycle,
    Policy,
    Audit,
}

/// The closed 31-member set of fully-qualified governance event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AssetDiscovered,
    AssetRegistered,
    AssetDecommissioned,
    AssetOwnershipChanged,

    ScanStarted,
    ScanCompleted,
    ScanFailed,
    ScanFindingDetected,

    ClassificationAssigned,
    ClassificationChanged,
    ClassificationReviewed,
    ClassificationDisputed,

    ComplianceCheckPassed,
    ComplianceCheckFailed,
    ComplianceWaiverGranted,
    ComplianceWaiverExpired,

    EnforcementBlocked,
    EnforcementAllowed,
    EnforcementQuarantined,
    EnforcementOverrideApplied,

    LifecycleCreated,
    LifecycleUpdated,
    LifecycleRetired,
    LifecycleArchived,

    PolicyCreated,
    PolicyUpdated,
    PolicyDeleted,
    PolicyViolationDetected,

    AuditAccessLogged,
    AuditExportRequested,
    AuditReviewCompleted,
}

/// `CATEGORY_OF(type)`: every event type maps to exactly one category.
pub fn category_of(event_type: EventType) -> EventCategory {
    use EventCategory::*;
    use EventType::*;
    match event_type {
        AssetDiscovered | AssetRegistered | AssetDecommissioned | AssetOwnershipChanged => Asset,
        ScanStarted | ScanCompleted | ScanFailed | ScanFindingDetected => Scan,
        ClassificationAssigned | ClassificationChanged | ClassificationReviewed
        | ClassificationDisputed => Classification,
        ComplianceCheckPassed | ComplianceCheckFailed | ComplianceWaiverGranted
        | ComplianceWaiverExpired => Compliance,
        EnforcementBlocked | EnforcementAllowed | EnforcementQuarantined
        | EnforcementOverrideApplied => Enforcement,
        LifecycleCreated | LifecycleUpdated | LifecycleRetired | LifecycleArchived => Lifecycle,
        PolicyCreated | PolicyUpdated | PolicyDeleted | PolicyViolationDetected => Policy,
        AuditAccessLogged | AuditExportRequested | AuditReviewCompleted => Audit,
    }
}

/// `CRITICALITY_OF(type)`: the builder's default criticality, overridable per §4.C12.
pub fn default_criticality(event_type: EventType) -> Criticality {
    use Criticality::*;
    use EventType::*;
    match event_type {
        EnforcementBlocked | PolicyViolationDetected | ComplianceCheckFailed
        | ScanFindingDetected => Critical,
        ScanFailed
        | EnforcementQuarantined
        | EnforcementOverrideApplied
        | ClassificationDisputed
        | ComplianceWaiverExpired
        | AssetDecommissioned => High,
        _ => Normal,
    }
}

/// Three-level event severity, influencing buffer flush and channel choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Normal,
    High,
    Critical,
}

impl Criticality {
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::Critical)
    }
}

/// Identity of the principal that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceIdentity {
    #[serde(rename = "type")]
    pub identity_type: String,
    pub subject: String,
}

/// Provenance of the tool and environment that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSource {
    pub tool: String,
    #[serde(rename = "toolVersion")]
    pub tool_version: String,
    #[serde(rename = "orgId")]
    pub org_id: String,
    #[serde(rename = "instanceId")]
    pub instance_id: String,
    pub identity: SourceIdentity,
    pub environment: String,
}

/// The immutable governance event envelope.
///
/// Constructed exclusively through [`crate::builder`], never assembled and
/// mutated field-by-field: once built, an event is shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceEvent {
    pub id: String,
    #[serde(rename = "specVersion")]
    pub spec_version: String,
    #[serde(rename = "schemaVersion")]
    pub schema_version: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub category: EventCategory,
    pub criticality: Criticality,
    pub source: EventSource,
    #[serde(rename = "orgId")]
    pub org_id: String,
    #[serde(rename = "assetId")]
    pub asset_id: String,
    #[serde(rename = "producedAt")]
    pub produced_at: DateTime<Utc>,
    #[serde(rename = "receivedAt", skip_serializing_if = "Option::is_none")]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(rename = "goldenThread")]
    pub golden_thread: GoldenThread,
    pub hash: String,
    #[serde(rename = "previousHash", skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(rename = "parentEventId", skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<String>,
    #[serde(rename = "correlationId", skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub data: BTreeMap<String, Value>,
}

impl GovernanceEvent {
    /// `category` MUST equal `CATEGORY_OF(type)` — this is the invariant the
    /// validator checks; this accessor is what both the builder and the
    /// validator consult.
    pub fn expected_category(&self) -> EventCategory {
        category_of(self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_type_has_a_category() {
        let all = [
            EventType::AssetDiscovered,
            EventType::AssetRegistered,
            EventType::AssetDecommissioned,
            EventType::AssetOwnershipChanged,
            EventType::ScanStarted,
            EventType::ScanCompleted,
            EventType::ScanFailed,
            EventType::ScanFindingDetected,
            EventType::ClassificationAssigned,
            EventType::ClassificationChanged,
            EventType::ClassificationReviewed,
            EventType::ClassificationDisputed,
            EventType::ComplianceCheckPassed,
            EventType::ComplianceCheckFailed,
            EventType::ComplianceWaiverGranted,
            EventType::ComplianceWaiverExpired,
            EventType::EnforcementBlocked,
            EventType::EnforcementAllowed,
            EventType::EnforcementQuarantined,
            EventType::EnforcementOverrideApplied,
            EventType::LifecycleCreated,
            EventType::LifecycleUpdated,
            EventType::LifecycleRetired,
            EventType::LifecycleArchived,
            EventType::PolicyCreated,
            EventType::PolicyUpdated,
            EventType::PolicyDeleted,
            EventType::PolicyViolationDetected,
            EventType::AuditAccessLogged,
            EventType::AuditExportRequested,
            EventType::AuditReviewCompleted,
        ];
        assert_eq!(all.len(), 31);
        for t in all {
            let _ = category_of(t);
            let _ = default_criticality(t);
        }
    }

    #[test]
    fn category_matches_type_family() {
        assert_eq!(category_of(EventType::AssetDiscovered), EventCategory::Asset);
        assert_eq!(category_of(EventType::EnforcementBlocked), EventCategory::Enforcement);
        assert_eq!(category_of(EventType::AuditReviewCompleted), EventCategory::Audit);
    }

    #[test]
    fn enforcement_blocked_is_critical_by_default() {
        assert_eq!(default_criticality(EventType::EnforcementBlocked), Criticality::Critical);
    }
}
