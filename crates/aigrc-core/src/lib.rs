//! # aigrc-core
//!
//! Core types and algorithms for the AIGRC governance event pipeline:
//! deterministic canonicalization, content-addressed hashing, event
//! identity, Golden Thread accountability linkage, and the typed builder
//! that produces frozen [`GovernanceEvent`] values.
//!
//! ## Quick Start
//!
//! ```rust
//! use aigrc_core::{EventBuilder, AssetEventType, EventSource, SourceIdentity};
//! use aigrc_core::identity::{SourceProfile, StandardSource};
//! use aigrc_core::golden_thread::{GoldenThread, GoldenThreadStatus};
//! use chrono::Utc;
//! use std::collections::BTreeMap;
//!
//! let source = EventSource {
//!     tool: "scanner".into(),
//!     tool_version: "1.0.0".into(),
//!     org_id: "org-pangolabs".into(),
//!     instance_id: "inst-1".into(),
//!     identity: SourceIdentity { identity_type: "service".into(), subject: "scanner-svc".into() },
//!     environment: "production".into(),
//! };
//!
//! let golden_thread = GoldenThread::Linked {
//!     system: "jira".into(),
//!     reference: "FIN-1234".into(),
//!     url: "https://jira.example.com/FIN-1234".into(),
//!     status: GoldenThreadStatus::Active,
//!     verified_at: None,
//! };
//!
//! let mut data = BTreeMap::new();
//! data.insert("assetName".to_string(), serde_json::json!("model-a"));
//!
//! let event = EventBuilder::new("aigrc-events@1.0.0", source, "asset-1", Utc::now(), golden_thread, data)
//!     .asset(AssetEventType::Discovered, SourceProfile::Standard(StandardSource {
//!         org_id: "org-pangolabs",
//!         tool: "scanner",
//!         event_type: "asset.discovered",
//!         asset_id: "asset-1",
//!         produced_at: Utc::now(),
//!     }))
//!     .unwrap();
//!
//! assert!(event.hash.starts_with("sha256:"));
//! ```

pub mod builder;
pub mod canon;
pub mod error;
pub mod event;
pub mod golden_thread;
pub mod hash;
pub mod identity;
pub mod outcome;

pub use builder::{
    AssetEventType, AuditEventType, BuildError, ClassificationEventType, ComplianceEventType,
    EnforcementEventType, EventBuilder, LifecycleEventType, PolicyEventType, ScanEventType,
};
pub use canon::{CanonError, Canonicalizer, DEFAULT_EXCLUDED_KEYS};
pub use error::{EventErrorCode, ValidationError};
pub use event::{
    category_of, default_criticality, Criticality, EventCategory, EventSource, EventType,
    GovernanceEvent, SourceIdentity, SPEC_VERSION,
};
pub use golden_thread::{GoldenThread, GoldenThreadStatus, GoldenThreadError};
pub use hash::{hash, parse_hash, verify, HashError, VerifyResult, HASH_PREFIX};
pub use identity::{HighFrequencySource, LocalSequence, SourceProfile, StandardSource};
pub use outcome::{BatchResponse, EventOutcome};
