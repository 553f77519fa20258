//! The data model shipped to the backend.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::SystemTime;

/// One named, timestamped, dimensioned value bound for the backend.
///
/// Distribution-shaped metrics (histogram and timer percentiles) additionally carry a
/// [`StatisticSet`] summarizing the whole distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPoint {
    name: String,
    timestamp: SystemTime,
    value: f64,
    statistics: Option<StatisticSet>,
    unit: Unit,
    dimensions: Dimensions,
}

impl DataPoint {
    pub(crate) fn new(
        name: String,
        timestamp: SystemTime,
        value: f64,
        statistics: Option<StatisticSet>,
        unit: Unit,
        dimensions: Dimensions,
    ) -> Self {
        debug_assert!(!name.is_empty(), "data points must be named");

        Self {
            name,
            timestamp,
            value,
            statistics,
            unit,
            dimensions,
        }
    }

    /// The metric name, including any derived suffix such as `.one-minute` or `-perc0.990`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The harvest instant of the cycle that produced this point.
    #[must_use]
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// The scalar value.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Summary of the distribution this point was derived from, if any.
    #[must_use]
    pub fn statistics(&self) -> Option<&StatisticSet> {
        self.statistics.as_ref()
    }

    /// The unit of [`value()`][Self::value].
    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// The static dimensions attached to every point of the cycle.
    #[must_use]
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }
}

/// A (max, min, sample count, sum) summary of a distribution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatisticSet {
    max: f64,
    min: f64,
    sample_count: f64,
    sum: f64,
}

impl StatisticSet {
    /// Creates a statistic set from its parts.
    #[must_use]
    pub fn new(max: f64, min: f64, sample_count: f64, sum: f64) -> Self {
        Self {
            max,
            min,
            sample_count,
            sum,
        }
    }

    /// The largest value in the distribution.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// The smallest value in the distribution.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// How many values the distribution was built from.
    #[must_use]
    pub fn sample_count(&self) -> f64 {
        self.sample_count
    }

    /// The sum of all values in the distribution.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.sum
    }
}

/// The unit of a [`DataPoint`] value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Unit {
    /// A plain count or an instantaneous reading.
    Count,

    /// Occurrences per second.
    CountPerSecond,

    /// No particular unit, e.g. a percentile of arbitrary values.
    None,
}

impl Unit {
    /// The name of the unit as understood by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::CountPerSecond => "Count/Second",
            Self::None => "None",
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value pairs attached identically to every data point of a reporting cycle.
///
/// Keys are unique and kept in ascending order. Cloning is cheap: the pairs are shared.
///
/// # Example
///
/// ```
/// use tally_report::Dimensions;
///
/// let dimensions: Dimensions = [("service", "checkout"), ("region", "eu-west-1")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(dimensions.get("region"), Some("eu-west-1"));
/// assert_eq!(
///     dimensions.iter().map(|(key, _)| key).collect::<Vec<_>>(),
///     ["region", "service"]
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dimensions {
    // Sorted by key, keys unique.
    pairs: Arc<[(String, String)]>,
}

impl Dimensions {
    /// Dimensions with no pairs.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterates over the pairs in ascending key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// The value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .binary_search_by(|(candidate, _)| candidate.as_str().cmp(key))
            .ok()
            .and_then(|index| self.pairs.get(index))
            .map(|(_, value)| value.as_str())
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<BTreeMap<String, String>> for Dimensions {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self {
            pairs: map.into_iter().collect(),
        }
    }
}

/// Later pairs replace earlier pairs with the same key.
impl<K, V> FromIterator<(K, V)> for Dimensions
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect::<BTreeMap<_, _>>()
            .into()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(DataPoint: Send, Sync, Clone);
    assert_impl_all!(Dimensions: Send, Sync, Clone);

    #[test]
    fn dimensions_are_sorted_and_deduplicated() {
        let dimensions: Dimensions = [("b", "1"), ("a", "2"), ("b", "3")].into_iter().collect();

        assert_eq!(dimensions.len(), 2);
        assert_eq!(dimensions.iter().collect::<Vec<_>>(), [("a", "2"), ("b", "3")]);
    }

    #[test]
    fn dimensions_lookup() {
        let dimensions: Dimensions = [("host", "web-1"), ("env", "prod")].into_iter().collect();

        assert_eq!(dimensions.get("env"), Some("prod"));
        assert_eq!(dimensions.get("host"), Some("web-1"));
        assert_eq!(dimensions.get("zone"), None);
    }

    #[test]
    fn empty_dimensions() {
        let dimensions = Dimensions::empty();

        assert!(dimensions.is_empty());
        assert_eq!(dimensions.iter().count(), 0);
        assert_eq!(dimensions.get("anything"), None);
    }

    #[test]
    fn unit_names() {
        assert_eq!(Unit::Count.to_string(), "Count");
        assert_eq!(Unit::CountPerSecond.to_string(), "Count/Second");
        assert_eq!(Unit::None.to_string(), "None");
    }
}
