//! `ProducerClient`: the HTTP surface a producer uses to push events (C10).
//!
//! Built on `reqwest::Client`. Retries exponential-backoff on 5xx/network
//! failures up to `max_retries`; 4xx (other than 429) never retries. `dispose`
//! cancels in-flight requests via a shared `tokio::sync::Notify` rather than
//! `tokio_util::sync::CancellationToken` — this workspace doesn't otherwise
//! depend on `tokio-util`, and racing the request future against one
//! `Notify::notified()` wakeup gives the same cut-the-request-short behavior.

use crate::error::ClientError;
use aigrc_core::event::GovernanceEvent;
use aigrc_core::outcome::{BatchResponse, EventOutcome};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Default per-request timeout (§4.C10).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default retry ceiling for 5xx/network failures.
const DEFAULT_MAX_RETRIES: u32 = 3;
/// `Retry-After` fallback when a 429 response omits the header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub extra_headers: Vec<(String, String)>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            extra_headers: Vec::new(),
        }
    }
}

pub struct ProducerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
    disposed: AtomicBool,
    cancel: Arc<Notify>,
}

impl ProducerClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().timeout(config.timeout);
        if !config.extra_headers.is_empty() {
            let mut headers = reqwest::header::HeaderMap::new();
            for (k, v) in &config.extra_headers {
                if let (Ok(name), Ok(value)) = (
                    reqwest::header::HeaderName::from_bytes(k.as_bytes()),
                    reqwest::header::HeaderValue::from_str(v),
                ) {
                    headers.insert(name, value);
                }
            }
            builder = builder.default_headers(headers);
        }
        let http = builder.build().map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            max_retries: config.max_retries,
            disposed: AtomicBool::new(false),
            cancel: Arc::new(Notify::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /v1/events` (C7).
    pub async fn push(&self, event: &GovernanceEvent) -> Result<EventOutcome, ClientError> {
        let body = serde_json::to_value(event).map_err(|e| ClientError::Decode(e.to_string()))?;
        let response = self.request_with_retry(Method::POST, "/v1/events", Some(&body)).await?;
        self.decode_outcome(response).await
    }

    /// `POST /v1/events/batch` (C8).
    pub async fn push_batch(&self, events: &[GovernanceEvent]) -> Result<BatchResponse, ClientError> {
        if events.is_empty() {
            return Ok(BatchResponse::empty());
        }
        let body = serde_json::to_value(events).map_err(|e| ClientError::Decode(e.to_string()))?;
        let response = self.request_with_retry(Method::POST, "/v1/events/batch", Some(&body)).await?;
        self.decode_batch(response).await
    }

    /// Auto-selects the sync or batch channel per §4.C10:
    /// criticals pushed individually first (in order), then the remainder
    /// routed by size, results merged preserving that order.
    pub async fn send(&self, events: Vec<GovernanceEvent>) -> Result<BatchResponse, ClientError> {
        if events.is_empty() {
            return Ok(BatchResponse::empty());
        }
        if events.len() == 1 {
            let outcome = self.push(&events[0]).await?;
            let mut response = BatchResponse::empty();
            response.push(outcome);
            return Ok(response);
        }

        let (criticals, rest): (Vec<_>, Vec<_>) = events.into_iter().partition(|e| e.criticality.is_critical());

        let mut response = BatchResponse::empty();
        for event in &criticals {
            response.push(self.push(event).await?);
        }

        match rest.len() {
            0 => {}
            1 => response.push(self.push(&rest[0]).await?),
            _ => response.extend(self.push_batch(&rest).await?),
        }

        Ok(response)
    }

    /// `GET /v1/health`: success iff the response status is 2xx.
    pub async fn health_check(&self) -> Result<bool, ClientError> {
        let response = self.request_with_retry(Method::GET, "/v1/health", None).await?;
        Ok(response.status().is_success())
    }

    /// Cancels in-flight requests and marks the client unusable. Idempotent.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.cancel.notify_waiters();
    }

    async fn decode_outcome(&self, response: reqwest::Response) -> Result<EventOutcome, ClientError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ClientError::Network(e.to_string()))?;
        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
        } else {
            Err(self.error_for_status(status, &bytes))
        }
    }

    async fn decode_batch(&self, response: reqwest::Response) -> Result<BatchResponse, ClientError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ClientError::Network(e.to_string()))?;
        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
        } else {
            Err(self.error_for_status(status, &bytes))
        }
    }

    fn error_for_status(&self, status: StatusCode, bytes: &[u8]) -> ClientError {
        let message = serde_json::from_slice::<Value>(bytes)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.get("message")).and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| String::from_utf8_lossy(bytes).to_string());

        if status.as_u16() == 429 {
            ClientError::RateLimited { retry_after_secs: DEFAULT_RETRY_AFTER_SECS, status_code: 429 }
        } else if status.is_server_error() {
            ClientError::ServerError { status_code: status.as_u16(), message }
        } else {
            ClientError::Rejected { status_code: status.as_u16(), message }
        }
    }

    async fn request_with_retry(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut attempt = 0u32;
        loop {
            if self.disposed.load(Ordering::SeqCst) {
                return Err(ClientError::Disposed);
            }

            match self.send_once(method.clone(), path, body).await {
                Ok(response) => {
                    let status = response.status();
                    if status.as_u16() == 429 {
                        let retry_after = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                        return Err(ClientError::RateLimited { retry_after_secs: retry_after, status_code: 429 });
                    }
                    if status.is_server_error() && attempt < self.max_retries {
                        attempt += 1;
                        self.backoff(attempt).await?;
                        continue;
                    }
                    return Ok(response);
                }
                Err(ClientError::Disposed) => return Err(ClientError::Disposed),
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "producer client request failed, retrying");
                    self.backoff(attempt).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn backoff(&self, attempt: u32) -> Result<(), ClientError> {
        // `attempt` is 1-based (incremented before this call); the first retry
        // waits 2^0 * 1000ms, the second 2^1 * 1000ms.
        let delay = Duration::from_millis(2u64.pow(attempt - 1) * 1000);
        tokio::select! {
            _ = tokio::time::sleep(delay) => Ok(()),
            _ = self.cancel.notified() => Err(ClientError::Disposed),
        }
    }

    async fn send_once(&self, method: Method, path: &str, body: Option<&Value>) -> Result<reqwest::Response, ClientError> {
        let mut builder = self.http.request(method, self.url(path)).bearer_auth(&self.api_key);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let request = builder.build().map_err(|e| ClientError::Network(e.to_string()))?;

        tokio::select! {
            result = self.http.execute(request) => result.map_err(|e| {
                if e.is_timeout() {
                    ClientError::RequestTimedOut
                } else {
                    ClientError::Network(e.to_string())
                }
            }),
            _ = self.cancel.notified() => Err(ClientError::Disposed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_strips_trailing_slashes() {
        let config = ClientConfig::new("https://ingest.example.com///", "key");
        let client = ProducerClient::new(config).unwrap();
        assert_eq!(client.url("/v1/health"), "https://ingest.example.com/v1/health");
    }

    #[tokio::test]
    async fn dispose_marks_client_unusable() {
        let client = ProducerClient::new(ClientConfig::new("https://ingest.example.com", "key")).unwrap();
        client.dispose();
        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, ClientError::Disposed));
    }

    #[tokio::test]
    async fn send_with_no_events_never_calls_the_network() {
        let client = ProducerClient::new(ClientConfig::new("https://ingest.invalid.example", "key")).unwrap();
        let response = client.send(Vec::new()).await.unwrap();
        assert_eq!(response.results.len(), 0);
    }
}
