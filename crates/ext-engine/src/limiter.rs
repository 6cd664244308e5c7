//! Global throttle for remote metadata calls.
//!
//! The remote API enforces one global rate ceiling for metadata requests, so
//! a single shared [`RateLimiter`] instance guards every version-resolution
//! call. Bulk file downloads hit a different endpoint with its own limit and
//! are throttled by the downloader's concurrency pool instead.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Time source seam so the limiter is testable with a fake clock.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by the tokio timer.
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Serializes outbound metadata calls to respect a minimum inter-call
/// interval.
///
/// The last-call timestamp is the only mutable state shared across logical
/// operations; holding the internal mutex across the sleep is what makes
/// concurrent callers queue up one behind another.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Limiter backed by the system clock.
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, Arc::new(SystemClock))
    }

    /// Limiter with an injected clock, for tests.
    pub fn with_clock(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
            clock,
        }
    }

    /// Block until at least `min_interval` has elapsed since the previous
    /// call returned. The first call ever returns immediately.
    pub async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = self.clock.now().duration_since(previous);
            if elapsed < self.min_interval {
                self.clock.sleep(self.min_interval - elapsed).await;
            }
        }
        *last_call = Some(self.clock.now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    /// Deterministic clock: `sleep` advances time instantly and records the
    /// requested duration.
    struct FakeClock {
        origin: Instant,
        offset: StdMutex<Duration>,
        sleeps: StdMutex<Vec<Duration>>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                origin: Instant::now(),
                offset: StdMutex::new(Duration::ZERO),
                sleeps: StdMutex::new(Vec::new()),
            }
        }

        fn advance(&self, duration: Duration) {
            *self.offset.lock().unwrap() += duration;
        }

        fn recorded_sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.origin + *self.offset.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
            self.advance(duration);
        }
    }

    #[tokio::test]
    async fn first_call_does_not_sleep() {
        let clock = Arc::new(FakeClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(2), clock.clone());

        limiter.wait().await;
        assert!(clock.recorded_sleeps().is_empty());
    }

    #[tokio::test]
    async fn back_to_back_calls_are_spaced_by_min_interval() {
        let clock = Arc::new(FakeClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(2), clock.clone());

        limiter.wait().await;
        let first_done = clock.now();
        limiter.wait().await;
        let second_done = clock.now();

        assert!(second_done.duration_since(first_done) >= Duration::from_secs(2));
        assert_eq!(clock.recorded_sleeps(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn no_sleep_when_interval_already_elapsed() {
        let clock = Arc::new(FakeClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(2), clock.clone());

        limiter.wait().await;
        clock.advance(Duration::from_secs(3));
        limiter.wait().await;

        assert!(clock.recorded_sleeps().is_empty());
    }

    #[tokio::test]
    async fn partial_elapse_sleeps_the_remainder() {
        let clock = Arc::new(FakeClock::new());
        let limiter = RateLimiter::with_clock(Duration::from_secs(2), clock.clone());

        limiter.wait().await;
        clock.advance(Duration::from_millis(500));
        limiter.wait().await;

        assert_eq!(clock.recorded_sleeps(), vec![Duration::from_millis(1500)]);
    }
}
