//! Closed error taxonomy for the producer HTTP client (C10).

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("request timed out")]
    RequestTimedOut,
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64, status_code: u16 },
    #[error("request rejected by the server ({status_code}): {message}")]
    Rejected { status_code: u16, message: String },
    #[error("server error ({status_code}) after exhausting retries: {message}")]
    ServerError { status_code: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("client has been disposed")]
    Disposed,
    #[error("response body could not be decoded: {0}")]
    Decode(String),
}

impl ClientError {
    /// 5xx and network failures are retried by the client; 4xx (other than
    /// 429, handled separately) are not.
    pub fn is_retryable(status: u16) -> bool {
        (500..600).contains(&status)
    }
}
