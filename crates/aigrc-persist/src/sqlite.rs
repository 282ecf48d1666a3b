//! SQLite-backed store, for deployments needing durability across restarts.

use crate::backend::{ListFilter, StoreBackend, StoreError};
use aigrc_core::event::GovernanceEvent;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Wire form (`asset_discovered`, `high`, ...) used as the stored/queryable
/// column value, matching the strings producers and query params use.
fn wire_value<T: Serialize>(value: T) -> Result<String, StoreError> {
    serde_json::to_value(value)
        .map_err(|e| StoreError::Serde(e.to_string()))?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| StoreError::Serde("expected a string-serializable enum".to_string()))
}

/// SQLite configuration, mirroring the environment-driven config style used
/// throughout the pipeline (see `AIGRC_DATABASE_URL` in the server binary).
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    pub url: String,
    pub max_connections: u32,
    pub wal_mode: bool,
    pub busy_timeout_secs: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:aigrc.db?mode=rwc".to_string(),
            max_connections: 5,
            wal_mode: true,
            busy_timeout_secs: 30,
        }
    }
}

impl SqliteConfig {
    pub fn memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            wal_mode: false,
            busy_timeout_secs: 5,
        }
    }
}

pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    pub async fn new(config: SqliteConfig) -> Result<Self, StoreError> {
        let connect_options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Io(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(config.busy_timeout_secs as u64));

        let connect_options = if config.wal_mode {
            connect_options.journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        } else {
            connect_options
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS governance_events (
                org_id TEXT NOT NULL,
                id TEXT NOT NULL,
                asset_id TEXT NOT NULL,
                event_type TEXT NOT NULL,
                criticality TEXT NOT NULL,
                produced_at TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (org_id, id)
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        info!(url = %config.url, "sqlite event store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl StoreBackend for SqliteBackend {
    async fn insert_if_absent(&self, event: &GovernanceEvent) -> Result<bool, StoreError> {
        let payload = serde_json::to_string(event).map_err(|e| StoreError::Serde(e.to_string()))?;
        let event_type = wire_value(event.event_type)?;
        let criticality = wire_value(event.criticality)?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO governance_events (org_id, id, asset_id, event_type, criticality, produced_at, payload) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.org_id)
        .bind(&event.id)
        .bind(&event.asset_id)
        .bind(event_type)
        .bind(criticality)
        .bind(event.produced_at.to_rfc3339())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, org_id: &str, id: &str) -> Result<Option<GovernanceEvent>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT payload FROM governance_events WHERE org_id = ? AND id = ?",
        )
        .bind(org_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        row.map(|(payload,)| serde_json::from_str(&payload).map_err(|e| StoreError::Serde(e.to_string())))
            .transpose()
    }

    async fn list(&self, org_id: &str, filter: &ListFilter) -> Result<Vec<GovernanceEvent>, StoreError> {
        let limit = if filter.limit == 0 { i64::MAX } else { filter.limit as i64 };

        let since = filter.since.map(|s| s.to_rfc3339());

        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT payload FROM governance_events
            WHERE org_id = ?
              AND (? IS NULL OR asset_id = ?)
              AND (? IS NULL OR event_type = ?)
              AND (? IS NULL OR criticality = ?)
              AND (? IS NULL OR produced_at >= ?)
            ORDER BY produced_at ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(org_id)
        .bind(filter.asset_id.as_deref())
        .bind(filter.asset_id.as_deref())
        .bind(filter.event_type.as_deref())
        .bind(filter.event_type.as_deref())
        .bind(filter.criticality.as_deref())
        .bind(filter.criticality.as_deref())
        .bind(since.as_deref())
        .bind(since.as_deref())
        .bind(limit)
        .bind(filter.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        rows.into_iter()
            .map(|(payload,)| serde_json::from_str(&payload).map_err(|e| StoreError::Serde(e.to_string())))
            .collect()
    }

    async fn list_asset_ids(&self, org_id: &str, limit: usize, offset: usize) -> Result<Vec<String>, StoreError> {
        let limit = if limit == 0 { i64::MAX } else { limit as i64 };

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT asset_id FROM governance_events WHERE org_id = ? ORDER BY asset_id ASC LIMIT ? OFFSET ?",
        )
        .bind(org_id)
        .bind(limit)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(rows.into_iter().map(|(asset_id,)| asset_id).collect())
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[tokio::test]
    async fn insert_and_get_round_trips() {
        let backend = SqliteBackend::new(SqliteConfig::memory()).await.unwrap();
        let event = sample_event("org-a", "evt_1");
        assert!(backend.insert_if_absent(&event).await.unwrap());
        assert!(!backend.insert_if_absent(&event).await.unwrap());
        let fetched = backend.get("org-a", "evt_1").await.unwrap().unwrap();
        assert_eq!(fetched.id, "evt_1");
    }
}
