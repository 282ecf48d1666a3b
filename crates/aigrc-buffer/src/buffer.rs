//! `ProducerBuffer`: size/time/criticality-triggered best-effort buffering (C9).
//!
//! The internal list is single-writer (the enqueuing caller); a flush
//! drains-by-swap — `std::mem::take` the current list, reset to empty, then
//! hand the taken list to a background task. No reader ever observes a
//! partially-drained buffer.

use crate::error::BufferError;
use aigrc_client::{ClientError, ProducerClient};
use aigrc_core::event::GovernanceEvent;
use aigrc_core::outcome::BatchResponse;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Cap on a single flushed chunk, matching the batch endpoint's own limit.
const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct BufferConfig {
    pub max_size: usize,
    pub flush_interval: Duration,
    pub flush_on_critical: bool,
    pub max_batch_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            flush_interval: Duration::from_secs(5),
            flush_on_critical: true,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

/// `Fresh -> Running -> Disposed`. Disposed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Fresh,
    Running,
    Disposed,
}

struct Inner {
    lifecycle: Lifecycle,
    events: Vec<GovernanceEvent>,
}

pub type FlushErrorHandler = dyn Fn(ClientError, Vec<GovernanceEvent>) + Send + Sync;

pub struct ProducerBuffer {
    client: Arc<ProducerClient>,
    config: BufferConfig,
    inner: Arc<Mutex<Inner>>,
    inflight: Arc<AtomicUsize>,
    on_flush_error: Arc<FlushErrorHandler>,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

impl ProducerBuffer {
    pub fn new(
        client: Arc<ProducerClient>,
        config: BufferConfig,
        on_flush_error: impl Fn(ClientError, Vec<GovernanceEvent>) + Send + Sync + 'static,
    ) -> Self {
        Self {
            client,
            config,
            inner: Arc::new(Mutex::new(Inner { lifecycle: Lifecycle::Fresh, events: Vec::new() })),
            inflight: Arc::new(AtomicUsize::new(0)),
            on_flush_error: Arc::new(on_flush_error),
            flush_task: Mutex::new(None),
        }
    }

    /// Transitions `Fresh -> Running` and spawns the periodic flush timer.
    /// A no-op once the buffer has left `Fresh`.
    pub async fn start(&self) {
        let mut inner = self.inner.lock().await;
        if inner.lifecycle != Lifecycle::Fresh {
            return;
        }
        inner.lifecycle = Lifecycle::Running;
        drop(inner);

        let inner_ref = self.inner.clone();
        let client = self.client.clone();
        let config = self.config.clone();
        let inflight = self.inflight.clone();
        let on_flush_error = self.on_flush_error.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.flush_interval);
            ticker.tick().await; // first tick is immediate; skip it so a fresh buffer doesn't flush nothing
            loop {
                ticker.tick().await;
                let drained = {
                    let mut guard = inner_ref.lock().await;
                    if guard.lifecycle == Lifecycle::Disposed {
                        break;
                    }
                    if guard.events.is_empty() {
                        continue;
                    }
                    std::mem::take(&mut guard.events)
                };
                spawn_flush(client.clone(), &config, drained, inflight.clone(), on_flush_error.clone());
            }
        });

        *self.flush_task.lock().await = Some(handle);
    }

    pub async fn add(&self, event: GovernanceEvent) -> Result<(), BufferError> {
        self.add_many(vec![event]).await
    }

    pub async fn add_many(&self, events: Vec<GovernanceEvent>) -> Result<(), BufferError> {
        let mut inner = self.inner.lock().await;
        if inner.lifecycle == Lifecycle::Disposed {
            return Err(BufferError::Disposed);
        }

        let has_critical = events.iter().any(|e| e.criticality.is_critical());
        inner.events.extend(events);

        let should_flush =
            inner.events.len() >= self.config.max_size || (has_critical && self.config.flush_on_critical);
        let drained = should_flush.then(|| std::mem::take(&mut inner.events));
        drop(inner);

        if let Some(drained) = drained {
            spawn_flush(self.client.clone(), &self.config, drained, self.inflight.clone(), self.on_flush_error.clone());
        }

        Ok(())
    }

    /// `size + inFlight`: buffered-but-unflushed plus events a background
    /// flush task is still processing.
    pub async fn pending(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.events.len() + self.inflight.load(Ordering::SeqCst)
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        self.inner.lock().await.lifecycle
    }

    /// Stops the flush timer and drains any remaining events through one
    /// final background flush. Idempotent: a second call is a no-op.
    pub async fn dispose(&self) {
        let mut inner = self.inner.lock().await;
        if inner.lifecycle == Lifecycle::Disposed {
            return;
        }
        inner.lifecycle = Lifecycle::Disposed;
        let drained = std::mem::take(&mut inner.events);
        drop(inner);

        if let Some(handle) = self.flush_task.lock().await.take() {
            handle.abort();
        }

        spawn_flush(self.client.clone(), &self.config, drained, self.inflight.clone(), self.on_flush_error.clone());
    }
}

fn spawn_flush(
    client: Arc<ProducerClient>,
    config: &BufferConfig,
    events: Vec<GovernanceEvent>,
    inflight: Arc<AtomicUsize>,
    on_flush_error: Arc<FlushErrorHandler>,
) {
    if events.is_empty() {
        return;
    }
    let max_batch_size = config.max_batch_size.max(1);
    inflight.fetch_add(events.len(), Ordering::SeqCst);

    tokio::spawn(async move {
        let count = events.len();
        if let Err(e) = flush_chunked(&client, max_batch_size, &events).await {
            tracing::warn!(error = %e, count, "buffer flush failed, events will not be re-buffered");
            on_flush_error(e, events);
        }
        inflight.fetch_sub(count, Ordering::SeqCst);
    });
}

/// 1 event -> Sync; 2..maxBatchSize -> one Batch; beyond that, sequential
/// chunked Batches. Stops at the first chunk failure — unflushed peers in
/// later chunks are reported to `onFlushError` alongside the whole batch,
/// never silently dropped.
async fn flush_chunked(
    client: &ProducerClient,
    max_batch_size: usize,
    events: &[GovernanceEvent],
) -> Result<BatchResponse, ClientError> {
    if events.len() == 1 {
        let mut response = BatchResponse::empty();
        response.push(client.push(&events[0]).await?);
        return Ok(response);
    }

    let mut response = BatchResponse::empty();
    for chunk in events.chunks(max_batch_size) {
        let chunk_response = client.push_batch(chunk).await?;
        response.extend(chunk_response);
    }
    Ok(response)
}
