use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, FanoutError};

/// When and how long to wait before re-invoking a failed endpoint call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total invocations allowed per call; 1 disables retries
    pub max_attempts: usize,
    /// Delay before the first retry, doubled on each later one
    pub base_delay_ms: u64,
    /// Ceiling for the doubled delay
    pub max_delay_ms: u64,
    /// Whether to subtract random jitter from backoff delays
    pub jitter: bool,
    /// Error kinds worth another attempt
    pub retry_on: Vec<ErrorKind>,
}

const DEFAULT_MAX_ATTEMPTS: usize = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 200;
const DEFAULT_MAX_DELAY_MS: u64 = 2_000;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}

impl RetryPolicy {
    /// Creates a default policy that retries transport failures.
    pub fn defaults() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: true,
            retry_on: vec![ErrorKind::Http, ErrorKind::RateLimited, ErrorKind::Provider],
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            retry_on: Vec::new(),
            ..Self::defaults()
        }
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the first retry delay and its ceiling, both in milliseconds.
    pub fn backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self.max_delay_ms = max_delay_ms;
        self
    }

    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn retry_on(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.retry_on = kinds.into_iter().collect();
        self
    }

    /// Contract violations are never retried, whatever `retry_on` lists.
    pub fn is_retryable(&self, err: &FanoutError) -> bool {
        let kind = err.kind();
        kind != ErrorKind::Contract && self.retry_on.contains(&kind)
    }

    /// Delay before retry number `attempt_index + 1`.
    pub fn backoff_delay(&self, attempt_index: usize) -> Duration {
        let mut delay = self
            .base_delay_ms
            .saturating_mul(1u64 << attempt_index.min(16))
            .min(self.max_delay_ms);
        if self.jitter && delay > 1 {
            let span = (delay / 2).max(1);
            delay -= rand::thread_rng().gen_range(0..span);
        }
        Duration::from_millis(delay)
    }
}
