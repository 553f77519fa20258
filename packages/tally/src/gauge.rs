use std::sync::atomic::{self, AtomicI64, AtomicU64};

const GAUGE_ACCESS_ORDERING: atomic::Ordering = atomic::Ordering::Relaxed;

/// An instantaneous integer reading, such as a queue depth.
///
/// # Example
///
/// ```
/// use tally::Gauge;
///
/// let gauge = Gauge::new();
/// gauge.update(42);
///
/// assert_eq!(gauge.value(), 42);
/// ```
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    /// Creates a gauge reading zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current reading.
    pub fn update(&self, value: i64) {
        self.value.store(value, GAUGE_ACCESS_ORDERING);
    }

    /// The current reading.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.value.load(GAUGE_ACCESS_ORDERING)
    }
}

/// An instantaneous floating point reading, such as a ratio or a temperature.
///
/// # Example
///
/// ```
/// use tally::GaugeFloat;
///
/// let gauge = GaugeFloat::new();
/// gauge.update(0.75);
///
/// assert!((gauge.value() - 0.75).abs() < f64::EPSILON);
/// ```
#[derive(Debug)]
pub struct GaugeFloat {
    // The bit pattern of an `f64`.
    bits: AtomicU64,
}

impl GaugeFloat {
    /// Creates a gauge reading `0.0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    /// Replaces the current reading.
    pub fn update(&self, value: f64) {
        self.bits.store(value.to_bits(), GAUGE_ACCESS_ORDERING);
    }

    /// The current reading.
    #[must_use]
    pub fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(GAUGE_ACCESS_ORDERING))
    }
}

impl Default for GaugeFloat {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Gauge: Send, Sync);
    assert_impl_all!(GaugeFloat: Send, Sync);

    #[test]
    fn gauge_keeps_last_value() {
        let gauge = Gauge::new();
        assert_eq!(gauge.value(), 0);

        gauge.update(5);
        gauge.update(-12);
        assert_eq!(gauge.value(), -12);
    }

    #[test]
    fn gauge_float_keeps_last_value() {
        let gauge = GaugeFloat::default();
        assert!(gauge.value().abs() < f64::EPSILON);

        gauge.update(1.5);
        gauge.update(-273.15);
        assert!((gauge.value() + 273.15).abs() < f64::EPSILON);
    }
}
