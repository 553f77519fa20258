use std::num::NonZero;

use crate::{DEFAULT_RESERVOIR_SIZE, SampleSnapshot, UniformSample};

/// The distribution of a stream of integer values, such as request sizes.
///
/// Values are kept in a uniform random reservoir of bounded size, so memory use does not grow
/// with the number of recorded values. Statistics and percentiles are computed over a
/// [`SampleSnapshot`].
///
/// # Example
///
/// ```
/// use tally::Histogram;
///
/// let histogram = Histogram::new();
/// histogram.update(1000);
/// histogram.update(500);
///
/// let snapshot = histogram.snapshot();
/// assert_eq!(snapshot.count(), 2);
/// assert_eq!(snapshot.sum(), 1500);
/// ```
#[derive(Debug)]
pub struct Histogram {
    sample: UniformSample,
}

impl Histogram {
    /// Creates a histogram retaining up to [`DEFAULT_RESERVOIR_SIZE`] values.
    #[must_use]
    pub fn new() -> Self {
        Self::with_reservoir_size(DEFAULT_RESERVOIR_SIZE)
    }

    /// Creates a histogram retaining up to `reservoir_size` values.
    #[must_use]
    pub fn with_reservoir_size(reservoir_size: NonZero<usize>) -> Self {
        Self {
            sample: UniformSample::new(reservoir_size),
        }
    }

    /// Records one value.
    pub fn update(&self, value: i64) {
        self.sample.update(value);
    }

    /// Takes a copy of the retained values for computing statistics.
    #[must_use]
    pub fn snapshot(&self) -> SampleSnapshot {
        self.sample.snapshot()
    }

    /// Forgets all recorded values.
    pub fn clear(&self) {
        self.sample.clear();
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}
