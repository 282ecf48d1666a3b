//! Typed, per-category constructors producing validated, frozen events.
//!
//! Each category exposes its own narrow sub-enum of event types so a caller
//! can't hand `asset()` a `scan.*` type at compile time — the mapping to the
//! closed `category` table is then infallible rather than asserted.

use crate::canon::Canonicalizer;
use crate::error::{EventErrorCode, ValidationError};
use crate::event::{
    default_criticality, Criticality, EventCategory, EventSource, EventType, GovernanceEvent,
};
use crate::golden_thread::GoldenThread;
use crate::hash;
use crate::identity::SourceProfile;
use serde_json::Value;
use std::collections::BTreeMap;

macro_rules! category_enum {
    ($name:ident { $($variant:ident => $full:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl From<$name> for EventType {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => EventType::$full),+
                }
            }
        }
    };
}

category_enum!(AssetEventType {
    Discovered => AssetDiscovered,
    Registered => AssetRegistered,
    Decommissioned => AssetDecommissioned,
    OwnershipChanged => AssetOwnershipChanged,
});

category_enum!(ScanEventType {
    Started => ScanStarted,
    Completed => ScanCompleted,
    Failed => ScanFailed,
    FindingDetected => ScanFindingDetected,
});

category_enum!(ClassificationEventType {
    Assigned => ClassificationAssigned,
    Changed => ClassificationChanged,
    Reviewed => ClassificationReviewed,
    Disputed => ClassificationDisputed,
});

category_enum!(ComplianceEventType {
    CheckPassed => ComplianceCheckPassed,
    CheckFailed => ComplianceCheckFailed,
    WaiverGranted => ComplianceWaiverGranted,
    WaiverExpired => ComplianceWaiverExpired,
});

category_enum!(EnforcementEventType {
    Blocked => EnforcementBlocked,
    Allowed => EnforcementAllowed,
    Quarantined => EnforcementQuarantined,
    OverrideApplied => EnforcementOverrideApplied,
});

category_enum!(LifecycleEventType {
    Created => LifecycleCreated,
    Updated => LifecycleUpdated,
    Retired => LifecycleRetired,
    Archived => LifecycleArchived,
});

category_enum!(PolicyEventType {
    Created => PolicyCreated,
    Updated => PolicyUpdated,
    Deleted => PolicyDeleted,
    ViolationDetected => PolicyViolationDetected,
});

category_enum!(AuditEventType {
    AccessLogged => AuditAccessLogged,
    ExportRequested => AuditExportRequested,
    ReviewCompleted => AuditReviewCompleted,
});

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("ENCODE_ERROR: {0}")]
    Canon(#[from] crate::canon::CanonError),
}

/// Accumulates the fields common to every category before a typed
/// constructor supplies the event type and freezes the result.
pub struct EventBuilder {
    schema_version: String,
    source: EventSource,
    asset_id: String,
    produced_at: chrono::DateTime<chrono::Utc>,
    golden_thread: GoldenThread,
    data: BTreeMap<String, Value>,
    criticality_override: Option<Criticality>,
    previous_hash: Option<String>,
    parent_event_id: Option<String>,
    correlation_id: Option<String>,
}

impl EventBuilder {
    pub fn new(
        schema_version: impl Into<String>,
        source: EventSource,
        asset_id: impl Into<String>,
        produced_at: chrono::DateTime<chrono::Utc>,
        golden_thread: GoldenThread,
        data: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            schema_version: schema_version.into(),
            source,
            asset_id: asset_id.into(),
            produced_at,
            golden_thread,
            data,
            criticality_override: None,
            previous_hash: None,
            parent_event_id: None,
            correlation_id: None,
        }
    }

    pub fn with_criticality(mut self, criticality: Criticality) -> Self {
        self.criticality_override = Some(criticality);
        self
    }

    pub fn with_previous_hash(mut self, previous_hash: impl Into<String>) -> Self {
        self.previous_hash = Some(previous_hash.into());
        self
    }

    pub fn with_parent_event_id(mut self, parent_event_id: impl Into<String>) -> Self {
        self.parent_event_id = Some(parent_event_id.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn asset(self, event_type: AssetEventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        self.build(event_type.into(), source_profile)
    }

    pub fn scan(self, event_type: ScanEventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        self.build(event_type.into(), source_profile)
    }

    pub fn classification(self, event_type: ClassificationEventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        self.build(event_type.into(), source_profile)
    }

    pub fn compliance(self, event_type: ComplianceEventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        self.build(event_type.into(), source_profile)
    }

    pub fn enforcement(self, event_type: EnforcementEventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        self.build(event_type.into(), source_profile)
    }

    pub fn lifecycle(self, event_type: LifecycleEventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        self.build(event_type.into(), source_profile)
    }

    pub fn policy(self, event_type: PolicyEventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        self.build(event_type.into(), source_profile)
    }

    pub fn audit(self, event_type: AuditEventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        self.build(event_type.into(), source_profile)
    }

    /// Shared freezing path: derive category, apply the criticality default
    /// (or override), derive the id from the producer's source profile,
    /// canonicalize and hash, then return the finished, immutable event.
    fn build(self, event_type: EventType, source_profile: SourceProfile<'_>) -> Result<GovernanceEvent, BuildError> {
        if self.data.is_empty() {
            return Err(ValidationError::new(EventErrorCode::EvtDataEmpty, "data must have at least one entry").into());
        }
        if !self.golden_thread.is_orphan_note_valid() {
            return Err(ValidationError::new(
                EventErrorCode::EvtOrphanNoteTooShort,
                "orphan remediationNote must be at least 10 characters",
            )
            .into());
        }

        let category = crate::event::category_of(event_type);
        let criticality = self.criticality_override.unwrap_or_else(|| default_criticality(event_type));
        let id = source_profile.derive_id();

        let mut event = GovernanceEvent {
            id,
            spec_version: crate::event::SPEC_VERSION.to_string(),
            schema_version: self.schema_version,
            event_type,
            category,
            criticality,
            org_id: self.source.org_id.clone(),
            source: self.source,
            asset_id: self.asset_id,
            produced_at: self.produced_at,
            received_at: None,
            golden_thread: self.golden_thread,
            hash: String::new(),
            previous_hash: self.previous_hash,
            signature: None,
            parent_event_id: self.parent_event_id,
            correlation_id: self.correlation_id,
            data: self.data,
        };

        let canon = Canonicalizer::default();
        let value = serde_json::to_value(&event).map_err(|e| crate::canon::CanonError::Encode(e.to_string()))?;
        let bytes = canon.canonicalize(&value)?;
        event.hash = hash::hash(&bytes);

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SourceIdentity;
    use crate::golden_thread::GoldenThreadStatus;
    use crate::identity::StandardSource;
    use chrono::Utc;
    use serde_json::json;

    fn source() -> EventSource {
        EventSource {
            tool: "scanner".into(),
            tool_version: "1.0.0".into(),
            org_id: "org-pangolabs".into(),
            instance_id: "inst-1".into(),
            identity: SourceIdentity { identity_type: "service".into(), subject: "scanner-svc".into() },
            environment: "production".into(),
        }
    }

    fn linked_thread() -> GoldenThread {
        GoldenThread::Linked {
            system: "jira".into(),
            reference: "FIN-1234".into(),
            url: "https://jira.example.com/FIN-1234".into(),
            status: GoldenThreadStatus::Active,
            verified_at: None,
        }
    }

    #[test]
    fn builder_derives_category_and_hashes_the_event() {
        let mut data = BTreeMap::new();
        data.insert("assetName".to_string(), json!("model-a"));

        let event = EventBuilder::new("aigrc-events@1.0.0", source(), "asset-1", Utc::now(), linked_thread(), data)
            .asset(
                AssetEventType::Discovered,
                SourceProfile::Standard(StandardSource {
                    org_id: "org-pangolabs",
                    tool: "scanner",
                    event_type: "asset.discovered",
                    asset_id: "asset-1",
                    produced_at: Utc::now(),
                }),
            )
            .unwrap();

        assert_eq!(event.category, EventCategory::Asset);
        assert!(event.hash.starts_with("sha256:"));
        assert!(event.id.starts_with("evt_"));
    }

    #[test]
    fn builder_rejects_empty_data() {
        let result = EventBuilder::new("aigrc-events@1.0.0", source(), "asset-1", Utc::now(), linked_thread(), BTreeMap::new())
            .asset(
                AssetEventType::Discovered,
                SourceProfile::Standard(StandardSource {
                    org_id: "org-pangolabs",
                    tool: "scanner",
                    event_type: "asset.discovered",
                    asset_id: "asset-1",
                    produced_at: Utc::now(),
                }),
            );
        assert!(matches!(result, Err(BuildError::Validation(_))));
    }

    #[test]
    fn builder_rejects_short_orphan_note() {
        let mut data = BTreeMap::new();
        data.insert("reason".to_string(), json!("no active link"));
        let orphan = GoldenThread::Orphan {
            reason: "no link".into(),
            declared_by: "user-1".into(),
            declared_at: Utc::now(),
            remediation_deadline: Utc::now(),
            remediation_note: "too short".into(),
        };

        let result = EventBuilder::new("aigrc-events@1.0.0", source(), "asset-1", Utc::now(), orphan, data)
            .asset(
                AssetEventType::Discovered,
                SourceProfile::Standard(StandardSource {
                    org_id: "org-pangolabs",
                    tool: "scanner",
                    event_type: "asset.discovered",
                    asset_id: "asset-1",
                    produced_at: Utc::now(),
                }),
            );
        assert!(matches!(result, Err(BuildError::Validation(_))));
    }
}
