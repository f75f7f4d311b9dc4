//! Outbound delivery of passed jobs to a downstream endpoint.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::types::JobRecord;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("outbound endpoint rejected the job: {status}")]
    Rejected { status: u16 },
    #[error("outbound delivery failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
}

/// Delivers one passed job downstream. Implementations own their own
/// retry policy.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    /// Returns the downstream response body on success.
    async fn dispatch(&self, job: &JobRecord) -> Result<String, DispatchError>;
}

/// No-op dispatcher used by default. Logs the job and reports success.
pub struct MockDispatcher;

#[async_trait]
impl JobDispatcher for MockDispatcher {
    async fn dispatch(&self, job: &JobRecord) -> Result<String, DispatchError> {
        info!(url = %job.url, title = ?job.title, "mock outbound dispatch");
        Ok("mock".to_string())
    }
}

/// POSTs the job as JSON with exponential backoff between attempts.
pub struct HttpDispatcher {
    client: reqwest::Client,
    endpoint: String,
    source: String,
    max_retries: u32,
}

impl HttpDispatcher {
    pub fn new(
        endpoint: String,
        source: String,
        timeout: Duration,
        max_retries: u32,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            source,
            max_retries,
        })
    }

    async fn attempt(&self, job: &JobRecord) -> Result<reqwest::Response, reqwest::Error> {
        let payload = serde_json::json!({
            "source": self.source,
            "job": job,
        });
        self.client.post(&self.endpoint).json(&payload).send().await
    }
}

// Doubling backoff, capped so a large retry budget cannot overflow the shift.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}

#[async_trait]
impl JobDispatcher for HttpDispatcher {
    async fn dispatch(&self, job: &JobRecord) -> Result<String, DispatchError> {
        let mut attempt = 0u32;
        loop {
            match self.attempt(job).await {
                Ok(response) if response.status().is_success() => {
                    let body = response.text().await.unwrap_or_default();
                    info!(url = %job.url, "outbound dispatch succeeded");
                    return Ok(body);
                }
                Ok(response) => {
                    // A response from the endpoint is final, no retry.
                    return Err(DispatchError::Rejected {
                        status: response.status().as_u16(),
                    });
                }
                Err(err) if attempt < self.max_retries => {
                    let backoff = backoff_delay(attempt);
                    warn!(
                        url = %job.url,
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        error = %err,
                        "outbound dispatch failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(DispatchError::RetriesExhausted {
                        attempts: attempt + 1,
                        source: err,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobRecord;

    fn sample_job() -> JobRecord {
        JobRecord {
            url: "https://acme.example/jobs/1".to_string(),
            title: Some("Backend Developer".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn mock_dispatcher_always_succeeds() {
        let dispatcher = MockDispatcher;
        let body = dispatcher.dispatch(&sample_job()).await.unwrap();
        assert_eq!(body, "mock");
    }

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(16), Duration::from_secs(65_536));
        // A misconfigured retry budget must not overflow the shift.
        assert_eq!(backoff_delay(200), Duration::from_secs(65_536));
    }

    #[tokio::test]
    async fn http_dispatcher_exhausts_retries_on_unreachable_endpoint() {
        tokio::time::pause();
        let dispatcher = HttpDispatcher::new(
            // Reserved TEST-NET-1 address, connection refused or timed out.
            "http://192.0.2.1:9/outbound".to_string(),
            "scout".to_string(),
            Duration::from_millis(50),
            2,
        )
        .unwrap();
        let err = dispatcher.dispatch(&sample_job()).await.unwrap_err();
        match err {
            DispatchError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
