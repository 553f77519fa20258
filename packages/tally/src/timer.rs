use std::time::{Duration, Instant};

use crate::{Histogram, Meter, MeterSnapshot, SampleSnapshot};

/// Measures how long something takes and how often it happens.
///
/// A timer is a [`Histogram`] of durations in nanoseconds combined with a [`Meter`] counting
/// the timed occurrences.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use tally::Timer;
///
/// let timer = Timer::new();
/// timer.update(Duration::from_millis(15));
///
/// let answer = timer.time(|| 6 * 7);
/// assert_eq!(answer, 42);
///
/// assert_eq!(timer.snapshot().count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    /// Creates a timer with no recorded durations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one duration.
    ///
    /// Durations longer than `i64::MAX` nanoseconds (about 292 years) are clamped.
    pub fn update(&self, duration: Duration) {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);

        self.histogram.update(nanos);
        self.meter.mark(1);
    }

    /// Records the time elapsed since `start`.
    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    /// Runs `f`, records how long it took and returns its result.
    pub fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.update_since(start);
        result
    }

    /// Takes a snapshot of the recorded durations and rates.
    #[must_use]
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            durations: self.histogram.snapshot(),
            rates: self.meter.snapshot(),
        }
    }
}

/// A point-in-time read of a [`Timer`]. Durations are in nanoseconds; rates are per second.
#[derive(Clone, Debug, PartialEq)]
pub struct TimerSnapshot {
    durations: SampleSnapshot,
    rates: MeterSnapshot,
}

impl TimerSnapshot {
    /// Number of durations ever recorded.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.durations.count()
    }

    /// The distribution of recorded durations, in nanoseconds.
    #[must_use]
    pub fn durations(&self) -> &SampleSnapshot {
        &self.durations
    }

    /// The rates at which durations were recorded.
    #[must_use]
    pub fn rates(&self) -> &MeterSnapshot {
        &self.rates
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Timer: Send, Sync);

    #[test]
    fn fresh_timer_has_no_samples() {
        let snapshot = Timer::new().snapshot();

        assert_eq!(snapshot.count(), 0);
        assert_eq!(snapshot.rates().count(), 0);
    }

    #[test]
    fn update_records_nanoseconds_and_marks_meter() {
        let timer = Timer::new();
        timer.update(Duration::from_micros(3));
        timer.update(Duration::from_micros(1));

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.count(), 2);
        assert_eq!(snapshot.durations().min(), 1_000);
        assert_eq!(snapshot.durations().max(), 3_000);
        assert_eq!(snapshot.rates().count(), 2);
    }

    #[test]
    fn huge_durations_are_clamped() {
        let timer = Timer::new();
        timer.update(Duration::MAX);

        assert_eq!(timer.snapshot().durations().max(), i64::MAX);
    }

    #[test]
    fn time_returns_closure_result() {
        let timer = Timer::new();

        let value = timer.time(|| "done");

        assert_eq!(value, "done");
        assert_eq!(timer.snapshot().count(), 1);
    }
}
