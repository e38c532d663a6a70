//! Clock & delay — component A
//!
//! `now()` and `delay(d)` are the only time-dependent operations the core
//! performs directly (every other suspension is store I/O). Both are
//! injectable so tests can drive the run engine and supervisor without
//! real wall-clock waits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Absolute time and cancellable delay, injected into every component that
/// needs either. `delay` must return once `d` has elapsed; it carries no
/// cancellation of its own — callers that need to race a delay against
/// another event use `tokio::select!` around it.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// The current absolute time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the caller for `d`, then return.
    async fn delay(&self, d: Duration);
}

/// Production clock backed by the system wall clock and the Tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn delay(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}

/// Convenience alias used throughout the crate; every long-lived component
/// holds a clock behind this shared pointer rather than owning one.
pub type SharedClock = Arc<dyn Clock>;

/// Deterministic clock for tests.
///
/// Real time never elapses on its own: `now()` returns a fixed instant that
/// only moves forward when a test calls [`FakeClock::advance`]. `delay`
/// suspends the caller until enough advances have accumulated to cover the
/// requested duration, then returns — so a test can simulate "11 seconds
/// pass" without actually waiting 11 seconds.
///
/// Grounded in the teacher's `TaskPoller::wait`, which races a real sleep
/// against a `watch::Receiver` (`worker/poller.rs`); here the race is against
/// a `tokio::sync::Notify` that `advance` fires instead of a shutdown signal.
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;
    use tokio::sync::Notify;

    struct Inner {
        now: parking_lot::Mutex<DateTime<Utc>>,
        notify: Notify,
    }

    #[derive(Clone)]
    pub struct FakeClock(Arc<Inner>);

    impl FakeClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self(Arc::new(Inner {
                now: parking_lot::Mutex::new(start),
                notify: Notify::new(),
            }))
        }

        /// Move the clock forward by `d` and wake any pending `delay` calls.
        pub fn advance(&self, d: Duration) {
            {
                let mut now = self.0.now.lock();
                *now = *now + chrono::Duration::from_std(d).expect("duration fits in chrono");
            }
            self.0.notify.notify_waiters();
        }
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.now.lock()
        }

        async fn delay(&self, d: Duration) {
            let deadline = self.now() + chrono::Duration::from_std(d).expect("duration fits");
            loop {
                if self.now() >= deadline {
                    return;
                }
                let notified = self.0.notify.notified();
                // Re-check after subscribing to avoid missing an advance that
                // happened between the check above and the subscription.
                if self.now() >= deadline {
                    return;
                }
                notified.await;
            }
        }
    }
}
