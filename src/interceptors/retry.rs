//! Automatic retries for transient HTTP statuses.
//!
//! Per retry key the interceptor walks `Idle -> Attempting -> (Success | Retrying -> Attempting | Exhausted)`.
//! It never re-dispatches itself: it answers [`ResponseAction::Retry`] with a delay and the
//! pipeline owns the wait (interruptible by cancellation) and the re-dispatch.

use super::{Interceptor, ResponseAction};
use crate::client::types::{RequestContext, RetryKey};
use crate::transport::HttpResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

/// Configuration for retry logic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub retryable_status_codes: Vec<u16>,
    /// `retry_delay_ms * 2^attempt` instead of a fixed delay.
    pub exponential_backoff: bool,
    /// Upper bound for a computed delay; `None` leaves it uncapped.
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            retryable_status_codes: vec![408, 429, 500, 502, 503, 504],
            exponential_backoff: true,
            max_delay_ms: None,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_retryable_status_codes(mut self, codes: impl Into<Vec<u16>>) -> Self {
        self.retryable_status_codes = codes.into();
        self
    }

    pub fn with_exponential_backoff(mut self, enable: bool) -> Self {
        self.exponential_backoff = enable;
        self
    }

    pub fn with_max_delay(mut self, cap: Duration) -> Self {
        self.max_delay_ms = Some(cap.as_millis() as u64);
        self
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    /// Delay before the retry that follows `attempt` previous retries.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.retry_delay_ms;
        let mut delay = if self.exponential_backoff {
            // exponential backoff: retry_delay * 2^attempt
            let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
            base.saturating_mul(factor)
        } else {
            base
        };
        if let Some(cap) = self.max_delay_ms {
            delay = delay.min(cap);
        }
        Duration::from_millis(delay)
    }
}

pub struct RetryInterceptor {
    config: RetryConfig,
    attempts: Mutex<HashMap<RetryKey, u32>>,
}

impl RetryInterceptor {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Retries already scheduled for `key`; 0 once the key has settled.
    pub fn attempts(&self, key: &RetryKey) -> u32 {
        self.lock().get(key).copied().unwrap_or(0)
    }

    /// Number of keys currently between their first dispatch and settling.
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RetryKey, u32>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear(&self, key: &RetryKey) {
        self.lock().remove(key);
    }

    /// Record one observed status for `key` and return the delay if it should be retried.
    fn decide(&self, key: &RetryKey, status: u16) -> Option<Duration> {
        if !self.config.is_retryable_status(status) {
            self.clear(key);
            return None;
        }

        let mut attempts = self.lock();
        let count = attempts.entry(key.clone()).or_insert(0);
        if *count < self.config.max_retries {
            let delay = self.config.backoff(*count);
            *count += 1;
            Some(delay)
        } else {
            attempts.remove(key);
            None
        }
    }
}

impl Default for RetryInterceptor {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

#[async_trait]
impl Interceptor for RetryInterceptor {
    fn name(&self) -> &str {
        "retry"
    }

    async fn after_dispatch(&self, ctx: &RequestContext, response: HttpResponse) -> ResponseAction {
        match self.decide(&ctx.retry_key, response.status) {
            Some(delay) => {
                warn!(
                    request_id = ctx.request_id.as_str(),
                    http_status = response.status,
                    attempt = ctx.attempt + 1,
                    max_retries = self.config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "retrying request"
                );
                ResponseAction::Retry { response, delay }
            }
            None => ResponseAction::Proceed(response),
        }
    }

    fn on_settled(&self, ctx: &RequestContext) {
        // Covers calls that end without a response or are dropped mid-backoff.
        self.clear(&ctx.retry_key);
    }
}
