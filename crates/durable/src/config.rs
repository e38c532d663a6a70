//! Worker configuration — spec.md §6
//!
//! A typed, serde-deserializable config struct with a builder, in the style
//! of the teacher's `WorkerPoolConfig` / `PollerConfig` / `RetryPolicy`
//! (`worker/pool.rs`, `worker/poller.rs`, `reliability/retry.rs`): an
//! embedding application can load these from file or environment and hand
//! the result straight to [`crate::worker::Worker::new`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options recognized by the worker. Defaults match spec.md §6 exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// After this many failed attempts, the workflow transitions to
    /// `aborted` instead of `failed`.
    pub max_failures: u32,

    /// Lease length; also the amount added to `wakeUpAt` when recording a
    /// nap, and the refresh applied to `timeoutAt` on every step write.
    #[serde(with = "duration_millis")]
    pub timeout_interval: Duration,

    /// Idle sleep between empty poll cycles.
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,

    /// Delay added to `timeoutAt` when writing a `failed` status.
    #[serde(with = "duration_millis")]
    pub retry_interval: Duration,

    /// Maximum number of `run` invocations the supervisor keeps in flight
    /// at once. Spec.md §4.5 leaves the exact cap as an implementation
    /// concern; this is that cap.
    pub max_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_failures: 3,
            timeout_interval: Duration::from_millis(60_000),
            poll_interval: Duration::from_millis(1_000),
            retry_interval: Duration::from_millis(60_000),
            max_concurrency: 10,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures.max(1);
        self
    }

    pub fn with_timeout_interval(mut self, interval: Duration) -> Self {
        self.timeout_interval = interval;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }
}

/// Serde support for `Duration` as milliseconds, matching the teacher's
/// `duration_millis` helper module (`worker/poller.rs`).
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
