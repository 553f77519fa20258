use std::sync::atomic::{self, AtomicI64};

/// We use `Relaxed` ordering because counters carry no happens-before obligations towards other
/// data. A reader only needs to see some recent value.
const COUNTER_ACCESS_ORDERING: atomic::Ordering = atomic::Ordering::Relaxed;

/// A signed integer that is incremented and decremented by producers and may be cleared by
/// a reporter.
///
/// # Example
///
/// ```
/// use tally::Counter;
///
/// let counter = Counter::new();
/// counter.inc(5);
/// counter.dec(2);
///
/// assert_eq!(counter.count(), 3);
/// ```
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicI64,
}

impl Counter {
    /// Creates a counter with a count of zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter by `n`.
    pub fn inc(&self, n: i64) {
        self.count.fetch_add(n, COUNTER_ACCESS_ORDERING);
    }

    /// Decrements the counter by `n`.
    pub fn dec(&self, n: i64) {
        self.count.fetch_sub(n, COUNTER_ACCESS_ORDERING);
    }

    /// The current count.
    #[must_use]
    pub fn count(&self) -> i64 {
        self.count.load(COUNTER_ACCESS_ORDERING)
    }

    /// Resets the count to zero.
    ///
    /// Increments that race with the clear may be lost. Use [`take()`][Self::take] to read
    /// and reset in one step.
    pub fn clear(&self) {
        self.count.store(0, COUNTER_ACCESS_ORDERING);
    }

    /// Returns the current count and resets it to zero in a single atomic step.
    ///
    /// Every increment lands either in the returned count or in the count that remains.
    ///
    /// # Example
    ///
    /// ```
    /// use tally::Counter;
    ///
    /// let counter = Counter::new();
    /// counter.inc(4);
    ///
    /// assert_eq!(counter.take(), 4);
    /// assert_eq!(counter.count(), 0);
    /// ```
    #[must_use]
    pub fn take(&self) -> i64 {
        self.count.swap(0, COUNTER_ACCESS_ORDERING)
    }
}
