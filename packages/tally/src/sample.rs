use std::num::NonZero;

use parking_lot::Mutex;
use rand::Rng;

/// Number of values retained by the reservoir of a histogram or timer unless configured otherwise.
///
/// This offers a 99.9% confidence level with a 5% margin of error assuming a normal distribution.
pub const DEFAULT_RESERVOIR_SIZE: NonZero<usize> = NonZero::new(1028).expect("1028 is not zero");

/// A uniform random sample of a stream of values, maintained with reservoir sampling.
///
/// Once the reservoir is full, each new value replaces a random retained value with
/// probability `reservoir_size / count`, so every value ever seen has the same chance of
/// being in the reservoir.
#[derive(Debug)]
pub(crate) struct UniformSample {
    reservoir_size: NonZero<usize>,
    state: Mutex<SampleState>,
}

#[derive(Debug, Default)]
struct SampleState {
    // Number of values ever offered, not only those retained.
    count: u64,
    values: Vec<i64>,
}

impl UniformSample {
    pub(crate) fn new(reservoir_size: NonZero<usize>) -> Self {
        Self {
            reservoir_size,
            state: Mutex::new(SampleState::default()),
        }
    }

    pub(crate) fn update(&self, value: i64) {
        let mut state = self.state.lock();
        state.count = state.count.saturating_add(1);

        if state.values.len() < self.reservoir_size.get() {
            state.values.push(value);
            return;
        }

        let slot = rand::rng().random_range(0..state.count);

        if let Ok(slot) = usize::try_from(slot)
            && let Some(retained) = state.values.get_mut(slot)
        {
            *retained = value;
        }
    }

    pub(crate) fn snapshot(&self) -> SampleSnapshot {
        let state = self.state.lock();
        SampleSnapshot::new(state.count, state.values.clone())
    }

    pub(crate) fn clear(&self) {
        let mut state = self.state.lock();
        state.count = 0;
        state.values.clear();
    }
}

/// A point-in-time copy of the values retained by a histogram or timer.
///
/// `count()` is the number of values ever recorded. All other statistics are computed over the
/// retained values, which are the same as all recorded values until the reservoir fills up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleSnapshot {
    count: u64,

    // Sorted ascending.
    values: Box<[i64]>,
}

impl SampleSnapshot {
    /// Creates a snapshot from a total count and the retained values, in any order.
    ///
    /// # Example
    ///
    /// ```
    /// use tally::SampleSnapshot;
    ///
    /// let snapshot = SampleSnapshot::new(2, vec![1000, 500]);
    ///
    /// assert_eq!(snapshot.min(), 500);
    /// assert_eq!(snapshot.max(), 1000);
    /// assert_eq!(snapshot.sum(), 1500);
    /// ```
    #[must_use]
    pub fn new(count: u64, mut values: Vec<i64>) -> Self {
        values.sort_unstable();

        Self {
            count,
            values: values.into_boxed_slice(),
        }
    }

    /// Number of values ever recorded.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The smallest retained value, or 0 if there are none.
    #[must_use]
    pub fn min(&self) -> i64 {
        self.values.first().copied().unwrap_or_default()
    }

    /// The largest retained value, or 0 if there are none.
    #[must_use]
    pub fn max(&self) -> i64 {
        self.values.last().copied().unwrap_or_default()
    }

    /// The sum of the retained values. Wraps on overflow.
    #[must_use]
    pub fn sum(&self) -> i64 {
        self.values
            .iter()
            .fold(0_i64, |sum, value| sum.wrapping_add(*value))
    }

    /// The arithmetic mean of the retained values, or 0 if there are none.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "statistics are reported as f64 - precision loss on huge values is acceptable"
    )]
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        self.values.iter().map(|v| *v as f64).sum::<f64>() / self.values.len() as f64
    }

    /// The value at percentile `p` (in `[0, 1]`) of the retained values, interpolating linearly
    /// between the two closest ranks. Returns 0 if there are no values.
    ///
    /// # Example
    ///
    /// ```
    /// use tally::SampleSnapshot;
    ///
    /// let snapshot = SampleSnapshot::new(2, vec![500, 1000]);
    ///
    /// assert!((snapshot.percentile(0.5) - 750.0).abs() < f64::EPSILON);
    /// assert!((snapshot.percentile(0.99) - 1000.0).abs() < f64::EPSILON);
    /// ```
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "statistics are reported as f64 - precision loss on huge values is acceptable"
    )]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "pos is in [1, len) when cast, so it is a valid positive index"
    )]
    pub fn percentile(&self, p: f64) -> f64 {
        let (Some(&first), Some(&last)) = (self.values.first(), self.values.last()) else {
            return 0.0;
        };

        let len = self.values.len() as f64;
        let pos = p * (len + 1.0);

        if pos < 1.0 {
            return first as f64;
        }

        if pos >= len {
            return last as f64;
        }

        let upper_index = pos as usize;
        let lower_index = upper_index.saturating_sub(1);

        let (Some(&lower), Some(&upper)) =
            (self.values.get(lower_index), self.values.get(upper_index))
        else {
            return last as f64;
        };

        let lower = lower as f64;
        let upper = upper as f64;

        lower + (pos - pos.floor()) * (upper - lower)
    }

    /// The retained values, sorted ascending.
    #[must_use]
    pub fn values(&self) -> &[i64] {
        &self.values
    }
}
