use std::time::Duration;

/// How often moving averages absorb the occurrences counted since the previous tick.
pub(crate) const EWMA_TICK_INTERVAL: Duration = Duration::from_secs(5);

/// An exponentially weighted moving average of a per-second rate, in the style of the
/// UNIX load average.
///
/// The average is advanced in fixed ticks of [`EWMA_TICK_INTERVAL`]. The owner counts
/// occurrences with [`add()`][Self::add] and calls [`tick()`][Self::tick] once per elapsed
/// interval. Until the first tick the rate is zero.
#[derive(Debug)]
pub(crate) struct Ewma {
    alpha: f64,
    uncounted: u64,

    // None until the first tick.
    rate_per_second: Option<f64>,
}

impl Ewma {
    /// A moving average that decays over the given number of minutes.
    pub(crate) fn over_minutes(minutes: f64) -> Self {
        let alpha = 1.0 - (-EWMA_TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp();

        Self {
            alpha,
            uncounted: 0,
            rate_per_second: None,
        }
    }

    pub(crate) fn add(&mut self, n: u64) {
        self.uncounted = self.uncounted.saturating_add(n);
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "rates are approximate by nature - precision loss on huge counts is acceptable"
    )]
    pub(crate) fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / EWMA_TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;

        self.rate_per_second = Some(match self.rate_per_second {
            Some(rate) => rate + self.alpha * (instant_rate - rate),
            None => instant_rate,
        });
    }

    pub(crate) fn rate(&self) -> f64 {
        self.rate_per_second.unwrap_or_default()
    }
}
