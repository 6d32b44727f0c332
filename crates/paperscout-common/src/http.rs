//! Pooled HTTP client shared by every network-facing component.
//!
//! One `reqwest::Client` (and therefore one connection pool) is built per
//! pipeline run so handshakes are amortized across the batch of candidates.
//! Retry with exponential backoff is applied only to the transient failure
//! classes: timeouts, server errors, and rate limiting. Not-found responses
//! are surfaced immediately so callers can fall back without burning the
//! retry budget.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, Method, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = "Paperscout/0.1 (research)";

/// Failure classes for a single fetch, tagged so callers can make fallback
/// decisions without inspecting exception internals.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("resource not found")]
    NotFound,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Transport(e.to_string())
        }
    }

    fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::NOT_FOUND {
            FetchError::NotFound
        } else {
            FetchError::Status(status.as_u16())
        }
    }
}

/// Retry schedule for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Status codes retried in addition to timeouts.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            retryable_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, err: &FetchError) -> bool {
        match err {
            FetchError::Timeout => true,
            FetchError::Status(code) => self.retryable_statuses.contains(code),
            FetchError::NotFound | FetchError::Transport(_) => false,
        }
    }

    /// Delay before the given retry attempt (0-based): base × 2^attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

/// HTTP client wrapper over a single pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, crate::PaperscoutError> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }

    /// Lightweight existence probe. Follows redirects; 200 means available.
    pub async fn head_ok(&self, url: &str, timeout: Duration) -> Result<bool, FetchError> {
        let resp = self
            .client
            .request(Method::HEAD, url)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        Ok(resp.status().is_success())
    }

    /// GET the body as text, retrying per `policy` on transient failures.
    pub async fn get_text_with_retry(
        &self,
        url: &str,
        timeout: Duration,
        policy: &RetryPolicy,
    ) -> Result<String, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.get_text(url, timeout).await {
                Ok(body) => return Ok(body),
                Err(e) if policy.is_retryable(&e) && attempt < policy.max_retries => {
                    let delay = policy.backoff(attempt);
                    warn!(url, attempt, error = %e, delay_ms = delay.as_millis() as u64, "Transient fetch failure, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single-attempt GET returning the body as text.
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }
        let body = resp.text().await.map_err(FetchError::from_reqwest)?;
        debug!(url, len = body.len(), "Fetched text body");
        Ok(body)
    }

    /// Single-attempt GET returning raw bytes (PDFs, images).
    pub async fn get_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status));
        }
        let bytes = resp.bytes().await.map_err(FetchError::from_reqwest)?;
        debug!(url, len = bytes.len(), "Fetched binary body");
        Ok(bytes.to_vec())
    }

    /// Expose the builder pattern for callers with bespoke requests
    /// (the embedding backend POSTs JSON).
    pub fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.post(url)
    }

    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client.get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds() {
        assert!(HttpClient::new().is_ok());
    }

    #[test]
    fn test_backoff_doubles() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(0), Duration::from_millis(500));
        assert_eq!(p.backoff(1), Duration::from_millis(1000));
        assert_eq!(p.backoff(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_timeout_is_retryable() {
        let p = RetryPolicy::default();
        assert!(p.is_retryable(&FetchError::Timeout));
        assert!(p.is_retryable(&FetchError::Status(503)));
        assert!(p.is_retryable(&FetchError::Status(429)));
    }

    #[test]
    fn test_not_found_is_not_retryable() {
        let p = RetryPolicy::default();
        assert!(!p.is_retryable(&FetchError::NotFound));
        assert!(!p.is_retryable(&FetchError::Status(400)));
        assert!(!p.is_retryable(&FetchError::Transport("dns".into())));
    }
}
