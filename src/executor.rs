//! Single-host request execution
//!
//! One logical request against one host is split into three steps:
//! - `send_once`: a bare HTTP attempt classified into success, overload or failure
//! - `OverloadRetryPolicy`: decides whether a 503 is retried and after what delay
//! - `record_outcome`: the only place host health is written after a request

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::HostError;
use crate::hosts::Host;

pub const HEALTH_PATH: &str = "/health";

/// Header carrying the per-host credential
pub const API_KEY_HEADER: &str = "X-API-Key";

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Retry budget for 503 responses that carry a Retry-After hint
#[derive(Debug, Clone)]
pub struct OverloadRetryPolicy {
    pub max_retries: u32,
    /// Used when the Retry-After value is not a whole number of seconds
    pub default_delay: Duration,
}

impl Default for OverloadRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            default_delay: Duration::from_secs(5),
        }
    }
}

impl OverloadRetryPolicy {
    /// Delay before retrying after the 503 seen on `attempt` (0-based), or
    /// `None` when the host should be given up on.
    pub fn next_delay(&self, attempt: u32, retry_after: Option<&str>) -> Option<Duration> {
        let hint = retry_after?;
        if attempt >= self.max_retries {
            return None;
        }
        Some(
            hint.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .unwrap_or(self.default_delay),
        )
    }
}

/// Result of a single HTTP attempt
enum Attempt {
    Success(Bytes),
    Overloaded { retry_after: Option<String> },
    Failed(HostError),
}

/// Executes requests against one specific host
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http_client: reqwest::Client,
    timeout: Duration,
    retry: OverloadRetryPolicy,
}

impl RequestExecutor {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::with_retry_policy(timeout, OverloadRetryPolicy::default())
    }

    pub fn with_retry_policy(timeout: Duration, retry: OverloadRetryPolicy) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().pool_max_idle_per_host(10).build()?;
        Ok(Self {
            http_client,
            timeout,
            retry,
        })
    }

    /// Timeout for one attempt on `path`
    pub fn timeout_for(&self, path: &str) -> Duration {
        if path == HEALTH_PATH {
            HEALTH_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Run one logical request: GET when `body` is `None`, POST with a JSON body otherwise.
    ///
    /// 503 responses are retried on the same host per the retry policy. The
    /// host's health state is updated exactly once from the final outcome.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        host: &Host,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, HostError> {
        let outcome = self.send_with_retries(host, path, body).await.and_then(|bytes| {
            serde_json::from_slice::<T>(&bytes).map_err(|source| HostError::Decode {
                host: host.name.clone(),
                path: path.to_string(),
                source,
            })
        });
        record_outcome(host, path, &outcome);
        outcome
    }

    async fn send_with_retries(
        &self,
        host: &Host,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Bytes, HostError> {
        let mut attempt = 0;
        loop {
            match self.send_once(host, path, body).await {
                Attempt::Success(bytes) => return Ok(bytes),
                Attempt::Failed(e) => return Err(e),
                Attempt::Overloaded { retry_after } => {
                    let consecutive = host.record_overload();
                    match self.retry.next_delay(attempt, retry_after.as_deref()) {
                        Some(delay) => {
                            tracing::warn!(
                                host = %host.name,
                                path,
                                attempt = attempt + 1,
                                delay_ms = delay.as_millis() as u64,
                                "GPU host overloaded, retrying after Retry-After delay"
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                        }
                        None => {
                            return Err(HostError::Overloaded {
                                host: host.name.clone(),
                                consecutive,
                            });
                        }
                    }
                }
            }
        }
    }

    async fn send_once(&self, host: &Host, path: &str, body: Option<&serde_json::Value>) -> Attempt {
        let url = format!("{}{}", host.url, path);
        let timeout = self.timeout_for(path);

        let mut request = match body {
            Some(_) => self.http_client.post(&url),
            None => self.http_client.get(&url),
        }
        .timeout(timeout)
        .header(CONTENT_TYPE, "application/json");

        if let Some(ref key) = host.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(host = %host.name, url = %url, "Sending request to GPU host");

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(transport_error(host, path, timeout, e)),
        };

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            return Attempt::Overloaded { retry_after };
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (host_name, path) = (host.name.clone(), path.to_string());
            let status = status.as_u16();
            return Attempt::Failed(if status == 401 || status == 403 {
                HostError::Unauthorized {
                    host: host_name,
                    path,
                    status,
                    body,
                }
            } else {
                HostError::Status {
                    host: host_name,
                    path,
                    status,
                    body,
                }
            });
        }

        match response.bytes().await {
            Ok(bytes) => Attempt::Success(bytes),
            Err(e) => Attempt::Failed(transport_error(host, path, timeout, e)),
        }
    }
}

fn transport_error(host: &Host, path: &str, timeout: Duration, source: reqwest::Error) -> HostError {
    if source.is_timeout() {
        HostError::Timeout {
            host: host.name.clone(),
            path: path.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        HostError::Transport {
            host: host.name.clone(),
            path: path.to_string(),
            source,
        }
    }
}

/// Apply the final outcome of a request to the host's health state
fn record_outcome<T>(host: &Host, path: &str, outcome: &Result<T, HostError>) {
    match outcome {
        Ok(_) => {
            if host.record_success() {
                tracing::info!(host = %host.name, path, "GPU host recovered");
            }
        }
        Err(e) => {
            tracing::warn!(host = %host.name, path, error = %e, "GPU host request failed, marking unhealthy");
            host.mark_unhealthy(e.to_string());
        }
    }
}
