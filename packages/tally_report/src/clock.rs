use std::future::Future;
use std::time::{Duration, SystemTime};

/// A clock abstraction that can be mocked for testing.
///
/// The reporter reads the harvest timestamp of each cycle from [`now()`][Self::now] and waits
/// between cycles with [`sleep()`][Self::sleep].
pub trait Clock: Send + Sync {
    /// The current wall clock time.
    fn now(&self) -> SystemTime;

    /// Sleep for the specified duration.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real clock implementation using `tokio::time` and the system wall clock.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct RealClock;

impl Clock for RealClock {
    #[cfg_attr(test, mutants::skip)] // Wall clock time cannot be asserted on.
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use fake::*;

#[cfg(any(test, feature = "test-util"))]
mod fake {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    /// Test clock whose wall clock time only moves when it sleeps.
    ///
    /// [`now()`][Clock::now] returns the start time plus the total duration slept so far.
    /// Sleeping is delegated to `tokio::time`, so tests running with paused time advance
    /// instantly. Clones share the same counters.
    #[derive(Debug, Clone)]
    pub struct FakeClock {
        start: SystemTime,
        sleep_count: Arc<AtomicU64>,
        total_sleep_nanos: Arc<AtomicU64>,
    }

    impl FakeClock {
        /// Creates a clock that starts at the given wall clock time.
        #[must_use]
        pub fn starting_at(start: SystemTime) -> Self {
            Self {
                start,
                sleep_count: Arc::new(AtomicU64::new(0)),
                total_sleep_nanos: Arc::new(AtomicU64::new(0)),
            }
        }

        /// Returns the number of times sleep was called.
        #[must_use]
        pub fn sleep_count(&self) -> u64 {
            self.sleep_count.load(Ordering::Relaxed)
        }

        /// Returns the total duration slept.
        #[must_use]
        pub fn total_sleep_duration(&self) -> Duration {
            Duration::from_nanos(self.total_sleep_nanos.load(Ordering::Relaxed))
        }
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::starting_at(SystemTime::UNIX_EPOCH)
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> SystemTime {
            self.start
                .checked_add(self.total_sleep_duration())
                .unwrap_or(self.start)
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;

            // Saturates at about 584 years of simulated sleep.
            let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);

            self.sleep_count.fetch_add(1, Ordering::Relaxed);
            self.total_sleep_nanos.fetch_add(nanos, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(RealClock: Clock, Send, Sync);
    assert_impl_all!(FakeClock: Clock, Send, Sync, Clone);

    #[tokio::test(start_paused = true)]
    async fn real_clock_sleeps_through_tokio() {
        let start = tokio::time::Instant::now();

        RealClock.sleep(Duration::from_secs(5)).await;

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn fake_clock_advances_by_sleeping() {
        let clock = FakeClock::default();
        let observer = clock.clone();

        assert_eq!(clock.now(), SystemTime::UNIX_EPOCH);

        clock.sleep(Duration::from_secs(10)).await;
        clock.sleep(Duration::from_secs(5)).await;

        assert_eq!(observer.sleep_count(), 2);
        assert_eq!(observer.total_sleep_duration(), Duration::from_secs(15));
        assert_eq!(
            observer.now(),
            SystemTime::UNIX_EPOCH + Duration::from_secs(15)
        );
    }
}
