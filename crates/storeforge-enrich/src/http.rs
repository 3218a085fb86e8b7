use std::time::{Duration, Instant};

use rand::Rng;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use storeforge_core::RequestPolicy;

use crate::errors::EnrichError;

/// Rate-limited HTTP client for a single source.
///
/// Consecutive requests are spaced by at least `min_interval_ms` plus a random
/// jitter. Timeouts, connection failures, 429 and 5xx responses are retried up
/// to `max_attempts` times; other statuses fail immediately.
pub struct Fetcher {
    client: Client,
    min_interval: Duration,
    jitter_ms: u64,
    max_attempts: u32,
    last_request: Option<Instant>,
}

impl Fetcher {
    pub fn new(policy: &RequestPolicy) -> Result<Self, EnrichError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(policy.timeout_secs))
            .user_agent(policy.user_agent.clone())
            .build()
            .map_err(|err| EnrichError::Config(format!("http client: {err}")))?;

        Ok(Self {
            client,
            min_interval: Duration::from_millis(policy.min_interval_ms),
            jitter_ms: policy.jitter_ms,
            max_attempts: policy.max_attempts.max(1),
            last_request: None,
        })
    }

    pub async fn get_json(&mut self, url: &str, query: &[(&str, &str)]) -> Result<Value, EnrichError> {
        let body = self.get_text(url, query).await?;
        serde_json::from_str(&body)
            .map_err(|err| EnrichError::Parse(format!("{url}: invalid json: {err}")))
    }

    pub async fn get_text(&mut self, url: &str, query: &[(&str, &str)]) -> Result<String, EnrichError> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            self.wait_turn().await;

            let outcome = self.client.get(url).query(query).send().await;
            self.last_request = Some(Instant::now());

            match outcome {
                Ok(response) if response.status().is_success() => {
                    debug!(url, attempt, status = %response.status(), "request succeeded");
                    return response
                        .text()
                        .await
                        .map_err(|err| EnrichError::Fetch(format!("{url}: {err}")));
                }
                Ok(response) => {
                    let status = response.status();
                    let message = format!("{url}: HTTP {status}");
                    if !is_retryable_status(status) {
                        return Err(EnrichError::Fetch(message));
                    }
                    warn!(url, attempt, status = %status, "request returned retryable status");
                    last_error = Some(message);
                }
                Err(err) => {
                    let message = format!("{url}: {err}");
                    if !(err.is_timeout() || err.is_connect() || err.is_request()) {
                        return Err(EnrichError::Fetch(message));
                    }
                    warn!(url, attempt, error = %err, "request failed");
                    last_error = Some(message);
                }
            }
        }

        Err(EnrichError::Fetch(format!(
            "giving up after {} attempts: {}",
            self.max_attempts,
            last_error.unwrap_or_default()
        )))
    }

    async fn wait_turn(&self) {
        let Some(last) = self.last_request else {
            return;
        };
        let jitter = if self.jitter_ms > 0 {
            Duration::from_millis(rand::rng().random_range(0..=self.jitter_ms))
        } else {
            Duration::ZERO
        };
        let ready_at = last + self.min_interval + jitter;
        let now = Instant::now();
        if ready_at > now {
            tokio::time::sleep(ready_at - now).await;
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_only_throttling_and_server_errors() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn spaces_consecutive_requests() {
        let policy = RequestPolicy {
            min_interval_ms: 50,
            jitter_ms: 0,
            ..RequestPolicy::default()
        };
        let mut fetcher = Fetcher::new(&policy).expect("fetcher");
        fetcher.last_request = Some(Instant::now());
        let start = Instant::now();
        fetcher.wait_turn().await;
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
