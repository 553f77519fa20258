use std::time::Instant;

use parking_lot::Mutex;

use crate::{EWMA_TICK_INTERVAL, Ewma};

/// Counts occurrences of something and tracks the rate at which they happen.
///
/// Rates are per second. The 1, 5 and 15 minute rates are exponentially weighted moving
/// averages that advance in 5 second ticks; they read zero until the first tick has elapsed.
/// The mean rate is the count divided by the lifetime of the meter.
///
/// # Example
///
/// ```
/// use tally::Meter;
///
/// let meter = Meter::new();
/// meter.mark(3);
///
/// let snapshot = meter.snapshot();
/// assert_eq!(snapshot.count(), 3);
/// ```
#[derive(Debug)]
pub struct Meter {
    start: Instant,
    state: Mutex<MeterState>,
}

#[derive(Debug)]
struct MeterState {
    count: u64,
    last_tick: Instant,

    one_minute: Ewma,
    five_minute: Ewma,
    fifteen_minute: Ewma,
}

impl MeterState {
    /// Advances the moving averages by every tick interval that has fully elapsed.
    fn catch_up(&mut self, now: Instant) {
        while now.saturating_duration_since(self.last_tick) >= EWMA_TICK_INTERVAL {
            self.one_minute.tick();
            self.five_minute.tick();
            self.fifteen_minute.tick();

            #[expect(
                clippy::arithmetic_side_effects,
                reason = "last_tick stays behind `now`, so this cannot overflow"
            )]
            {
                self.last_tick += EWMA_TICK_INTERVAL;
            }
        }
    }
}

impl Meter {
    /// Creates a meter with no occurrences, starting its lifetime now.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub(crate) fn starting_at(now: Instant) -> Self {
        Self {
            start: now,
            state: Mutex::new(MeterState {
                count: 0,
                last_tick: now,
                one_minute: Ewma::over_minutes(1.0),
                five_minute: Ewma::over_minutes(5.0),
                fifteen_minute: Ewma::over_minutes(15.0),
            }),
        }
    }

    /// Records `n` occurrences.
    pub fn mark(&self, n: u64) {
        self.mark_at(n, Instant::now());
    }

    pub(crate) fn mark_at(&self, n: u64, now: Instant) {
        let mut state = self.state.lock();
        state.catch_up(now);

        state.count = state.count.saturating_add(n);
        state.one_minute.add(n);
        state.five_minute.add(n);
        state.fifteen_minute.add(n);
    }

    /// The number of occurrences recorded so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    /// Takes a consistent snapshot of the count and all rates.
    #[must_use]
    pub fn snapshot(&self) -> MeterSnapshot {
        self.snapshot_at(Instant::now())
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "rates are approximate by nature - precision loss on huge counts is acceptable"
    )]
    pub(crate) fn snapshot_at(&self, now: Instant) -> MeterSnapshot {
        let mut state = self.state.lock();
        state.catch_up(now);

        let lifetime = now.saturating_duration_since(self.start).as_secs_f64();
        let rate_mean = if lifetime > 0.0 {
            state.count as f64 / lifetime
        } else {
            0.0
        };

        MeterSnapshot {
            count: state.count,
            rate1: state.one_minute.rate(),
            rate5: state.five_minute.rate(),
            rate15: state.fifteen_minute.rate(),
            rate_mean,
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time read of a [`Meter`]. All rates are per second.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeterSnapshot {
    count: u64,
    rate1: f64,
    rate5: f64,
    rate15: f64,
    rate_mean: f64,
}

impl MeterSnapshot {
    /// The number of occurrences recorded.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// One-minute exponentially weighted moving average rate.
    #[must_use]
    pub fn rate1(&self) -> f64 {
        self.rate1
    }

    /// Five-minute exponentially weighted moving average rate.
    #[must_use]
    pub fn rate5(&self) -> f64 {
        self.rate5
    }

    /// Fifteen-minute exponentially weighted moving average rate.
    #[must_use]
    pub fn rate15(&self) -> f64 {
        self.rate15
    }

    /// Mean rate over the lifetime of the meter.
    #[must_use]
    pub fn rate_mean(&self) -> f64 {
        self.rate_mean
    }
}
