//! Decides which data points are reported and which percentiles are computed.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use foldhash::HashSet;

use crate::encode::{PERCENTILE_INFIX, RATE_SUFFIXES};

/// The percentiles reported for histograms and timers by the default filters.
pub const STANDARD_PERCENTILES: &[f64] = &[0.50, 0.75, 0.95, 0.99, 0.999, 1.0];

/// Decides, per data point, whether it is reported.
///
/// [`should_report()`][Self::should_report] is asked separately about every candidate data
/// point, including every derived one (each percentile, each rate), so a filter can drop a
/// histogram's 99.9th percentile while keeping its median.
///
/// Filters must not change metric state.
///
/// # Example
///
/// ```
/// use std::borrow::Cow;
///
/// use tally_report::{Filter, STANDARD_PERCENTILES};
///
/// /// Reports only the slow end of latency distributions.
/// #[derive(Debug)]
/// struct TailLatencyOnly;
///
/// impl Filter for TailLatencyOnly {
///     fn should_report(&self, name: &str, _value: f64) -> bool {
///         !name.starts_with("latency") || name.ends_with("-perc0.990")
///     }
///
///     fn percentiles(&self, _name: &str) -> Cow<'_, [f64]> {
///         Cow::Borrowed(&[0.99])
///     }
/// }
/// ```
pub trait Filter: Send + Sync {
    /// Whether the data point with the given (possibly derived) name and value is reported.
    fn should_report(&self, name: &str, value: f64) -> bool;

    /// The percentiles in `[0, 1]` to compute for the histogram or timer with the given name.
    fn percentiles(&self, name: &str) -> Cow<'_, [f64]>;
}

impl<F> Filter for Arc<F>
where
    F: Filter + ?Sized,
{
    fn should_report(&self, name: &str, value: f64) -> bool {
        (**self).should_report(name, value)
    }

    fn percentiles(&self, name: &str) -> Cow<'_, [f64]> {
        (**self).percentiles(name)
    }
}

/// Reports every data point, with the [`STANDARD_PERCENTILES`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl Filter for AcceptAll {
    fn should_report(&self, _name: &str, _value: f64) -> bool {
        true
    }

    fn percentiles(&self, _name: &str) -> Cow<'_, [f64]> {
        Cow::Borrowed(STANDARD_PERCENTILES)
    }
}

/// Reports nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct RejectAll;

impl Filter for RejectAll {
    fn should_report(&self, _name: &str, _value: f64) -> bool {
        false
    }

    fn percentiles(&self, _name: &str) -> Cow<'_, [f64]> {
        Cow::Borrowed(&[])
    }
}

/// Wraps another filter and additionally drops data points whose value is exactly zero.
///
/// Idle counters then cost nothing to report.
///
/// # Example
///
/// ```
/// use tally_report::{AcceptAll, DropZeros, Filter};
///
/// let filter = DropZeros::new(AcceptAll);
///
/// assert!(filter.should_report("requests", 3.0));
/// assert!(!filter.should_report("requests", 0.0));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct DropZeros<F> {
    inner: F,
}

impl<F> DropZeros<F> {
    /// Drops zeros on top of the decisions made by `inner`.
    #[must_use]
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F> Filter for DropZeros<F>
where
    F: Filter,
{
    fn should_report(&self, name: &str, value: f64) -> bool {
        value != 0.0 && self.inner.should_report(name, value)
    }

    fn percentiles(&self, name: &str) -> Cow<'_, [f64]> {
        self.inner.percentiles(name)
    }
}

/// Reports data points whose name satisfies a predicate.
///
/// The predicate sees derived names such as `requests.one-minute` or `latency-perc0.500`.
///
/// # Example
///
/// ```
/// use tally_report::{Filter, NameFilter};
///
/// let filter = NameFilter::new(|name: &str| !name.starts_with("debug_"));
///
/// assert!(filter.should_report("requests", 1.0));
/// assert!(!filter.should_report("debug_allocations", 1.0));
/// ```
pub struct NameFilter<P> {
    predicate: P,
    percentiles: Cow<'static, [f64]>,
}

impl<P> NameFilter<P>
where
    P: Fn(&str) -> bool + Send + Sync,
{
    /// Reports the data points for which `predicate` returns `true`, with the
    /// [`STANDARD_PERCENTILES`].
    #[must_use]
    pub fn new(predicate: P) -> Self {
        Self {
            predicate,
            percentiles: Cow::Borrowed(STANDARD_PERCENTILES),
        }
    }

    /// Replaces the percentiles computed for every histogram and timer.
    #[must_use]
    pub fn with_percentiles(mut self, percentiles: impl Into<Cow<'static, [f64]>>) -> Self {
        self.percentiles = percentiles.into();
        self
    }
}

impl<P> Filter for NameFilter<P>
where
    P: Fn(&str) -> bool + Send + Sync,
{
    fn should_report(&self, name: &str, _value: f64) -> bool {
        (self.predicate)(name)
    }

    fn percentiles(&self, _name: &str) -> Cow<'_, [f64]> {
        Cow::Borrowed(&self.percentiles)
    }
}

impl<P> fmt::Debug for NameFilter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameFilter")
            .field("percentiles", &self.percentiles)
            .finish_non_exhaustive()
    }
}

/// Reports only metrics whose names are in an enabled set that can be replaced at any time.
///
/// This is meant to be driven by an external source of truth, such as a configuration store
/// polled in the background: the poller calls [`replace()`][Self::replace] with the latest
/// set while a reporter keeps reading through a shared `Arc<EnabledMetrics>`.
///
/// A derived data point is reported if either its own name or the name of the metric it was
/// derived from is enabled. Enabling `latency` therefore reports all of `latency.count`,
/// `latency.one-minute`, `latency-perc0.990` and so on, while enabling only
/// `latency-perc0.990` reports just that one point.
///
/// # Example
///
/// ```
/// use tally_report::{EnabledMetrics, Filter};
///
/// let filter = EnabledMetrics::new(["requests"]);
/// assert!(filter.should_report("requests.one-minute", 1.0));
/// assert!(!filter.should_report("errors", 1.0));
///
/// filter.replace(["errors"]);
/// assert!(!filter.should_report("requests.one-minute", 1.0));
/// assert!(filter.should_report("errors", 1.0));
/// ```
#[derive(Debug)]
pub struct EnabledMetrics {
    enabled: ArcSwap<HashSet<String>>,
    percentiles: Cow<'static, [f64]>,
}

impl EnabledMetrics {
    /// Enables exactly the given names, with the [`STANDARD_PERCENTILES`].
    #[must_use]
    pub fn new<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            enabled: ArcSwap::from_pointee(names.into_iter().map(Into::into).collect()),
            percentiles: Cow::Borrowed(STANDARD_PERCENTILES),
        }
    }

    /// Replaces the percentiles computed for every histogram and timer.
    #[must_use]
    pub fn with_percentiles(mut self, percentiles: impl Into<Cow<'static, [f64]>>) -> Self {
        self.percentiles = percentiles.into();
        self
    }

    /// Atomically replaces the enabled set. Decisions already in progress are unaffected.
    pub fn replace<I>(&self, names: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.enabled
            .store(Arc::new(names.into_iter().map(Into::into).collect()));
    }

    /// Whether the given exact name is enabled.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.load().contains(name)
    }
}

impl Filter for EnabledMetrics {
    fn should_report(&self, name: &str, _value: f64) -> bool {
        let enabled = self.enabled.load();
        enabled.contains(name) || base_name(name).is_some_and(|base| enabled.contains(base))
    }

    fn percentiles(&self, _name: &str) -> Cow<'_, [f64]> {
        Cow::Borrowed(&self.percentiles)
    }
}

/// The name of the metric a derived data point name was produced from, or `None` if the name
/// does not carry a derived suffix.
fn base_name(name: &str) -> Option<&str> {
    if let Some((base, percentile)) = name.rsplit_once(PERCENTILE_INFIX)
        && is_encoded_percentile(percentile)
    {
        return Some(base);
    }

    RATE_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
}

/// Whether `text` has the `0.990` shape percentiles are given in data point names.
fn is_encoded_percentile(text: &str) -> bool {
    text.split_once('.').is_some_and(|(whole, fraction)| {
        !whole.is_empty()
            && fraction.len() == 3
            && whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
    })
}
