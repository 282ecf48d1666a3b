//! In-memory store backend: the default for tests and for a config that
//! doesn't set `AIGRC_DATABASE_URL`.

use crate::backend::{ListFilter, StoreBackend, StoreError};
use aigrc_core::event::{Criticality, EventType, GovernanceEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Wire form of `type`/`criticality`, used for filter matching against the
/// same strings producers and query params use (`asset_discovered`, `high`).
fn wire_event_type(t: EventType) -> String {
    serde_json::to_value(t).map(|v| v.as_str().unwrap_or_default().to_string()).unwrap_or_default()
}

fn wire_criticality(c: Criticality) -> String {
    serde_json::to_value(c).map(|v| v.as_str().unwrap_or_default().to_string()).unwrap_or_default()
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    events: RwLock<HashMap<(String, String), GovernanceEvent>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn insert_if_absent(&self, event: &GovernanceEvent) -> Result<bool, StoreError> {
        let key = (event.org_id.clone(), event.id.clone());
        let mut events = self.events.write().await;
        if events.contains_key(&key) {
            return Ok(false);
        }
        events.insert(key, event.clone());
        Ok(true)
    }

    async fn get(&self, org_id: &str, id: &str) -> Result<Option<GovernanceEvent>, StoreError> {
        let events = self.events.read().await;
        Ok(events.get(&(org_id.to_string(), id.to_string())).cloned())
    }

    async fn list(&self, org_id: &str, filter: &ListFilter) -> Result<Vec<GovernanceEvent>, StoreError> {
        let events = self.events.read().await;
        let mut matched: Vec<GovernanceEvent> = events
            .values()
            .filter(|e| e.org_id == org_id)
            .filter(|e| filter.asset_id.as_deref().map_or(true, |a| e.asset_id == a))
            .filter(|e| filter.since.map_or(true, |since| e.produced_at >= since))
            .filter(|e| filter.event_type.as_deref().map_or(true, |t| wire_event_type(e.event_type) == t))
            .filter(|e| filter.criticality.as_deref().map_or(true, |c| wire_criticality(e.criticality) == c))
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.produced_at);
        let limit = if filter.limit == 0 { matched.len() } else { filter.limit };
        Ok(matched.into_iter().skip(filter.offset).take(limit).collect())
    }

    async fn list_asset_ids(&self, org_id: &str, limit: usize, offset: usize) -> Result<Vec<String>, StoreError> {
        let events = self.events.read().await;
        let mut ids: Vec<String> =
            events.values().filter(|e| e.org_id == org_id).map(|e| e.asset_id.clone()).collect();
        ids.sort();
        ids.dedup();
        let limit = if limit == 0 { ids.len() } else { limit };
        Ok(ids.into_iter().skip(offset).take(limit).collect())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
