//! `EventStore`: dedup-aware persistence with per-event outcomes (C6).
//!
//! The dedup cache is the only shared mutable state on the server side
//! (§5). Mutation goes through [`EventStore::store`]/[`EventStore::store_many`],
//! which perform an atomic check-and-insert on the backend per event — no
//! whole-store lock is needed, since the backend's `insert_if_absent` owns
//! that critical section.

use crate::backend::{ListFilter, StoreBackend, StoreError};
use aigrc_core::error::{EventErrorCode, ValidationError};
use aigrc_core::event::GovernanceEvent;
use aigrc_core::outcome::{BatchResponse, EventOutcome};
use chrono::Utc;
use moka::future::Cache;
use std::sync::Arc;

/// A small bounded LRU cache fronting the backend for recently seen ids.
/// Entries are authoritative only when they reflect an accepted write — a
/// cache miss always falls through to the backend, never to a negative
/// answer.
#[derive(Clone)]
struct DedupCache {
    inner: Cache<(String, String), ()>,
}

impl DedupCache {
    fn new(capacity: u64) -> Self {
        Self { inner: Cache::new(capacity) }
    }

    async fn seen(&self, org_id: &str, id: &str) -> bool {
        self.inner.get(&(org_id.to_string(), id.to_string())).await.is_some()
    }

    async fn mark_seen(&self, org_id: &str, id: &str) {
        self.inner.insert((org_id.to_string(), id.to_string()), ()).await;
    }
}

pub struct EventStore {
    backend: Arc<dyn StoreBackend>,
    cache: DedupCache,
}

/// Maximum events accepted in a single batch submission (§4.C8).
pub const MAX_BATCH_SIZE: usize = 1000;

impl EventStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self::with_cache_capacity(backend, 10_000)
    }

    pub fn with_cache_capacity(backend: Arc<dyn StoreBackend>, cache_capacity: u64) -> Self {
        Self { backend, cache: DedupCache::new(cache_capacity) }
    }

    /// `store(event, authOrgId) -> {outcome, isNew}`.
    ///
    /// Org scoping is enforced before the dedup check: an event whose
    /// `orgId` differs from the authenticated principal's org is rejected
    /// with `EVT_ORG_MISMATCH` regardless of whether its id has been seen.
    pub async fn store(&self, mut event: GovernanceEvent, auth_org_id: &str) -> Result<EventOutcome, StoreError> {
        if event.org_id != auth_org_id {
            return Ok(EventOutcome::Rejected {
                id: event.id,
                error: ValidationError::new(EventErrorCode::EvtOrgMismatch, "event orgId does not match the authenticated principal's org")
                    .with_field("orgId"),
            });
        }

        if self.cache.seen(&event.org_id, &event.id).await {
            if let Some(existing) = self.backend.get(&event.org_id, &event.id).await? {
                return Ok(EventOutcome::Duplicate {
                    id: existing.id,
                    received_at: existing.received_at.unwrap_or_else(Utc::now),
                });
            }
        }

        event.received_at = Some(Utc::now());
        let inserted = self.backend.insert_if_absent(&event).await?;

        if inserted {
            self.cache.mark_seen(&event.org_id, &event.id).await;
            Ok(EventOutcome::Created { id: event.id, received_at: event.received_at.expect("just set") })
        } else {
            self.cache.mark_seen(&event.org_id, &event.id).await;
            let existing = self
                .backend
                .get(&event.org_id, &event.id)
                .await?
                .unwrap_or(event);
            Ok(EventOutcome::Duplicate {
                id: existing.id,
                received_at: existing.received_at.unwrap_or_else(Utc::now),
            })
        }
    }

    /// `storeMany(events[], authOrgId) -> BatchResponse`.
    ///
    /// Per-event outcome; a store failure on one event is treated as a
    /// per-event rejection (see SPEC_FULL.md Open Questions) rather than
    /// aborting the whole batch — peers still in the same call succeed or
    /// fail independently, preserving input order in `results[]`.
    pub async fn store_many(&self, events: Vec<GovernanceEvent>, auth_org_id: &str) -> BatchResponse {
        let mut response = BatchResponse::empty();
        for event in events {
            let id = event.id.clone();
            match self.store(event, auth_org_id).await {
                Ok(outcome) => response.push(outcome),
                Err(e) => response.push(EventOutcome::Rejected {
                    id,
                    error: ValidationError::new(EventErrorCode::EvtInternal, e.to_string()),
                }),
            }
        }
        response
    }

    pub async fn find_by_id(&self, id: &str, auth_org_id: &str) -> Result<Option<GovernanceEvent>, StoreError> {
        self.backend.get(auth_org_id, id).await
    }

    pub async fn list(&self, auth_org_id: &str, filter: &ListFilter) -> Result<Vec<GovernanceEvent>, StoreError> {
        self.backend.list(auth_org_id, filter).await
    }

    pub async fn list_asset_ids(&self, auth_org_id: &str, limit: usize, offset: usize) -> Result<Vec<String>, StoreError> {
        self.backend.list_asset_ids(auth_org_id, limit, offset).await
    }

    pub async fn is_healthy(&self) -> bool {
        self.backend.is_healthy().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use aigrc_core::{EventSource, GoldenThread, GoldenThreadStatus, SourceIdentity};
    use std::collections::BTreeMap;

    fn sample_event(org_id: &str, id: &str) -> GovernanceEvent {
        GovernanceEvent {
            id: id.to_string(),
            spec_version: "1.0".into(),
            schema_version: "aigrc-events@1.0.0".into(),
            event_type: aigrc_core::EventType::AssetDiscovered,
            category: aigrc_core::EventCategory::Asset,
            criticality: aigrc_core::Criticality::Normal,
            source: EventSource {
                tool: "t".into(),
                tool_version: "1".into(),
                org_id: org_id.into(),
                instance_id: "i".into(),
                identity: SourceIdentity { identity_type: "service".into(), subject: "s".into() },
                environment: "production".into(),
            },
            org_id: org_id.to_string(),
            asset_id: "asset-1".into(),
            produced_at: chrono::Utc::now(),
            received_at: None,
            golden_thread: GoldenThread::Linked {
                system: "jira".into(),
                reference: "X".into(),
                url: "u".into(),
                status: GoldenThreadStatus::Active,
                verified_at: None,
            },
            hash: format!("sha256:{}", "0".repeat(64)),
            previous_hash: None,
            signature: None,
            parent_event_id: None,
            correlation_id: None,
            data: BTreeMap::new(),
        }
    }

    fn store() -> EventStore {
        EventStore::new(Arc::new(MemoryBackend::new()))
    }

    #[tokio::test]
    async fn first_store_is_created_second_is_duplicate_with_same_received_at() {
        let store = store();
        let outcome1 = store.store(sample_event("org-a", "evt_1"), "org-a").await.unwrap();
        let outcome2 = store.store(sample_event("org-a", "evt_1"), "org-a").await.unwrap();

        let EventOutcome::Created { received_at: r1, .. } = outcome1 else { panic!("expected created") };
        let EventOutcome::Duplicate { received_at: r2, .. } = outcome2 else { panic!("expected duplicate") };
        assert_eq!(r1, r2);
    }

    #[tokio::test]
    async fn org_mismatch_is_rejected_before_dedup() {
        let store = store();
        let outcome = store.store(sample_event("org-other", "evt_1"), "org-a").await.unwrap();
        match outcome {
            EventOutcome::Rejected { error, .. } => assert_eq!(error.code, EventErrorCode::EvtOrgMismatch),
            other => panic!("expected rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn store_many_preserves_order_and_counters() {
        let store = store();
        let events = vec![sample_event("org-a", "evt_1"), sample_event("org-other", "evt_2"), sample_event("org-a", "evt_1")];
        let response = store.store_many(events, "org-a").await;
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.accepted, 1);
        assert_eq!(response.rejected, 1);
        assert_eq!(response.duplicate, 1);
        assert_eq!(response.results[0].id(), "evt_1");
        assert_eq!(response.results[1].id(), "evt_2");
        assert_eq!(response.results[2].id(), "evt_1");
    }

    #[tokio::test]
    async fn find_by_id_is_scoped_to_org() {
        let store = store();
        store.store(sample_event("org-a", "evt_1"), "org-a").await.unwrap();
        assert!(store.find_by_id("evt_1", "org-a").await.unwrap().is_some());
        assert!(store.find_by_id("evt_1", "org-b").await.unwrap().is_none());
    }
}
