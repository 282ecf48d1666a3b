//! Backend-agnostic persistence contract for governance events.
//!
//! [`EventStore`] (see `store.rs`) owns the dedup and org-scoping logic; a
//! `StoreBackend` only needs to offer atomic check-and-insert plus simple
//! lookups, so swapping the in-memory backend for SQLite (or any future
//! durable store) never touches the dedup invariant.

use aigrc_core::event::GovernanceEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend I/O error: {0}")]
    Io(String),
    #[error("event failed to (de)serialize: {0}")]
    Serde(String),
}

/// Optional filters for listing events within an organization.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub asset_id: Option<String>,
    pub event_type: Option<String>,
    pub criticality: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
    pub offset: usize,
}

#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Inserts the event iff no record with the same `(org_id, id)` exists.
    /// Returns `true` if this call performed the insert, `false` if a record
    /// already existed (the event passed in is then discarded by the
    /// caller, which already has the existing record's `receivedAt`).
    async fn insert_if_absent(&self, event: &GovernanceEvent) -> Result<bool, StoreError>;

    /// Looks up a previously accepted event, scoped to its owning org.
    async fn get(&self, org_id: &str, id: &str) -> Result<Option<GovernanceEvent>, StoreError>;

    async fn list(&self, org_id: &str, filter: &ListFilter) -> Result<Vec<GovernanceEvent>, StoreError>;

    /// Distinct `assetId`s seen for an org, ordered and paginated the same
    /// way as `list`.
    async fn list_asset_ids(&self, org_id: &str, limit: usize, offset: usize) -> Result<Vec<String>, StoreError>;

    async fn is_healthy(&self) -> bool;
}
