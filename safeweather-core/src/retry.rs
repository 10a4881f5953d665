//! Bounded retry with exponential backoff for provider requests.
//!
//! Retried: timeouts, connection failures, 5xx, 408 and 429.
//! Not retried: other 4xx (bad key, bad query) and request-building errors.

use std::{future::Future, time::Duration};

use reqwest::{Response, StatusCode};

const MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per retry.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self { max_attempts, initial_delay }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay before retry number `retry` (0-based), capped at 30s.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    NoRetry,
}

pub fn classify_error(error: &reqwest::Error) -> RetryDecision {
    if error.is_timeout() || error.is_connect() {
        return RetryDecision::Retry;
    }

    match error.status() {
        Some(status) => classify_status(status),
        None => RetryDecision::NoRetry,
    }
}

pub fn classify_status(status: StatusCode) -> RetryDecision {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        RetryDecision::Retry
    } else {
        RetryDecision::NoRetry
    }
}

/// Runs `operation` until it yields a non-retryable outcome or the attempts
/// run out. The last response or error is returned as-is.
pub async fn with_retry<F, Fut>(policy: &RetryPolicy, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        let outcome = operation().await;

        let decision = match &outcome {
            Ok(res) => classify_status(res.status()),
            Err(e) => classify_error(e),
        };

        if decision == RetryDecision::NoRetry || attempt >= attempts {
            if attempt > 1 && outcome.as_ref().is_ok_and(|r| r.status().is_success()) {
                tracing::info!(attempt, "provider request succeeded after retry");
            }
            return outcome;
        }

        let delay = policy.delay_for_retry(attempt - 1);
        match &outcome {
            Ok(res) => tracing::warn!(
                status = %res.status(),
                attempt,
                attempts,
                ?delay,
                "retryable provider status"
            ),
            Err(e) => tracing::warn!(error = %e, attempt, attempts, ?delay, "retryable provider error"),
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
