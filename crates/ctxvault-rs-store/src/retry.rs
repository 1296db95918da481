//! Bounded retries with linear backoff for transient I/O failures.

use crate::classify::classify;
use crate::error::StoreError;
use ctxvault_rs_config::RetryConfig;
use ctxvault_rs_protocol::{StoreEvent, StoreEventSink, StoreOperation};
use log::{debug, warn};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay(),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Runs I/O closures under a `RetryPolicy`.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sink: Arc<dyn StoreEventSink>,
}

impl RetryExecutor {
    /// Create an executor reporting retries to `sink`.
    pub fn new(policy: RetryPolicy, sink: Arc<dyn StoreEventSink>) -> Self {
        Self { policy, sink }
    }

    /// Active policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds, fails with a non-recoverable error, or the
    /// attempt budget runs out.
    ///
    /// Non-recoverable failures return on the first attempt with their own
    /// variant; exhaustion returns `StoreError::RetriesExhausted` wrapping the
    /// last cause.
    pub fn run<T, F>(
        &self,
        operation: StoreOperation,
        path: &Path,
        mut op: F,
    ) -> Result<T, StoreError>
    where
        F: FnMut() -> io::Result<T>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match op() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(
                            "{operation} succeeded after retry (path={}, attempt={attempt})",
                            path.display()
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !classify(&err).recoverable {
                return Err(StoreError::from_io(operation, path, err, attempt));
            }
            if attempt >= max_attempts {
                warn!(
                    "{operation} gave up after {attempt} attempts (path={}): {err}",
                    path.display()
                );
                return Err(StoreError::RetriesExhausted {
                    operation,
                    path: path.to_path_buf(),
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "{operation} failed, retrying (path={}, attempt={attempt}, delay_ms={}): {err}",
                path.display(),
                delay.as_millis()
            );
            self.sink.emit(StoreEvent::RetryScheduled {
                operation,
                attempt,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                reason: err.to_string(),
            });
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            attempt += 1;
        }
    }
}
