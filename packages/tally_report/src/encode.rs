//! Turns metric snapshots into data points.
//!
//! Every metric kind has a fixed encoding:
//!
//! | Kind                   | Data points                                                             |
//! |------------------------|-------------------------------------------------------------------------|
//! | Counter                | `<name>` (`Count`)                                                      |
//! | Gauge, floating gauge  | `<name>` (`Count`)                                                      |
//! | Histogram              | `<name>-perc<p>` per percentile, with a statistic set (`None`)          |
//! | Meter                  | `<name>.count` (`Count`), then `.one-minute`, `.five-minute`, `.fifteen-minute`, `.mean` (`Count/Second`) |
//! | Timer                  | the five meter points, then the histogram points; nothing if it never recorded |
//!
//! Percentiles are formatted with three decimals, so the median of `latency` is reported as
//! `latency-perc0.500`. Every candidate data point goes through [`Filter::should_report()`]
//! on its own.

use std::time::SystemTime;

use tally::{MeterSnapshot, Metric, SampleSnapshot};
use tracing::trace;

use crate::{DataPoint, Dimensions, Filter, MetricSource, ReportingConfig, StatisticSet, Unit};

/// Separates a metric name from the percentile in the name of a percentile data point.
pub(crate) const PERCENTILE_INFIX: &str = "-perc";

const COUNT_SUFFIX: &str = ".count";
const ONE_MINUTE_SUFFIX: &str = ".one-minute";
const FIVE_MINUTE_SUFFIX: &str = ".five-minute";
const FIFTEEN_MINUTE_SUFFIX: &str = ".fifteen-minute";
const MEAN_SUFFIX: &str = ".mean";

/// Suffixes of the data points derived from a meter or timer.
pub(crate) const RATE_SUFFIXES: &[&str] = &[
    COUNT_SUFFIX,
    ONE_MINUTE_SUFFIX,
    FIVE_MINUTE_SUFFIX,
    FIFTEEN_MINUTE_SUFFIX,
    MEAN_SUFFIX,
];

/// The outcome of encoding every metric of a source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Encoded {
    points: Vec<DataPoint>,
    rejected: usize,
}

impl Encoded {
    /// The data points that passed the filter, in reporting order.
    #[must_use]
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Consumes the outcome, returning the data points that passed the filter.
    #[must_use]
    pub fn into_points(self) -> Vec<DataPoint> {
        self.points
    }

    /// How many candidate data points the filter rejected.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

/// Encodes every metric of `source` into data points stamped with `timestamp`.
///
/// Counters are read and cleared in one atomic step if the configuration says so, regardless
/// of whether the filter accepts their data point. Metrics with an empty name are skipped.
///
/// # Example
///
/// ```
/// use std::time::SystemTime;
///
/// use tally::Registry;
/// use tally_report::{AcceptAll, ReportingConfig, encode};
///
/// let registry = Registry::new();
/// registry.get_or_register_counter("requests").unwrap().inc(3);
///
/// let encoded = encode(
///     &registry,
///     &AcceptAll,
///     &ReportingConfig::default(),
///     SystemTime::now(),
/// );
///
/// let point = &encoded.points()[0];
/// assert_eq!(point.name(), "requests");
/// assert_eq!(point.value(), 3.0);
/// ```
pub fn encode<S, F>(
    source: &S,
    filter: &F,
    config: &ReportingConfig,
    timestamp: SystemTime,
) -> Encoded
where
    S: MetricSource + ?Sized,
    F: Filter + ?Sized,
{
    let mut encoder = Encoder {
        filter,
        dimensions: config.dimensions(),
        reset_counters: config.reset_counters_on_report(),
        timestamp,
        encoded: Encoded::default(),
    };

    source.each(&mut |name, metric| encoder.metric(name, metric));

    encoder.encoded
}

struct Encoder<'a, F: ?Sized> {
    filter: &'a F,
    dimensions: &'a Dimensions,
    reset_counters: bool,
    timestamp: SystemTime,
    encoded: Encoded,
}

impl<F> Encoder<'_, F>
where
    F: Filter + ?Sized,
{
    #[expect(
        clippy::cast_precision_loss,
        reason = "data points carry f64 values - precision loss on huge counts is acceptable"
    )]
    fn metric(&mut self, name: &str, metric: &Metric) {
        // A registry never holds unnamed metrics but other sources might.
        if name.is_empty() {
            trace!(kind = %metric.kind(), "skipping metric without a name");
            return;
        }

        match metric {
            Metric::Counter(counter) => {
                let count = if self.reset_counters {
                    counter.take()
                } else {
                    counter.count()
                };

                self.offer(name.to_owned(), count as f64, Unit::Count, None);
            }
            Metric::Gauge(gauge) => {
                self.offer(name.to_owned(), gauge.value() as f64, Unit::Count, None);
            }
            Metric::GaugeFloat(gauge) => {
                self.offer(name.to_owned(), gauge.value(), Unit::Count, None);
            }
            Metric::Histogram(histogram) => {
                self.distribution(name, &histogram.snapshot());
            }
            Metric::Meter(meter) => {
                self.rates(name, &meter.snapshot());
            }
            Metric::Timer(timer) => {
                let snapshot = timer.snapshot();

                if snapshot.count() == 0 {
                    return;
                }

                self.rates(name, snapshot.rates());
                self.distribution(name, snapshot.durations());
            }
            other => {
                trace!(name, kind = %other.kind(), "skipping metric of unsupported kind");
            }
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "data points carry f64 values - precision loss on huge counts is acceptable"
    )]
    fn rates(&mut self, name: &str, snapshot: &MeterSnapshot) {
        self.offer(
            format!("{name}{COUNT_SUFFIX}"),
            snapshot.count() as f64,
            Unit::Count,
            None,
        );

        for (suffix, rate) in [
            (ONE_MINUTE_SUFFIX, snapshot.rate1()),
            (FIVE_MINUTE_SUFFIX, snapshot.rate5()),
            (FIFTEEN_MINUTE_SUFFIX, snapshot.rate15()),
            (MEAN_SUFFIX, snapshot.rate_mean()),
        ] {
            self.offer(format!("{name}{suffix}"), rate, Unit::CountPerSecond, None);
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "data points carry f64 values - precision loss on huge values is acceptable"
    )]
    fn distribution(&mut self, name: &str, snapshot: &SampleSnapshot) {
        let filter = self.filter;
        let percentiles = filter.percentiles(name);

        if percentiles.is_empty() {
            return;
        }

        let statistics = StatisticSet::new(
            snapshot.max() as f64,
            snapshot.min() as f64,
            snapshot.count() as f64,
            snapshot.sum() as f64,
        );

        for &p in percentiles.iter() {
            self.offer(
                format!("{name}{PERCENTILE_INFIX}{p:.3}"),
                snapshot.percentile(p),
                Unit::None,
                Some(statistics),
            );
        }
    }

    fn offer(&mut self, name: String, value: f64, unit: Unit, statistics: Option<StatisticSet>) {
        if !self.filter.should_report(&name, value) {
            self.encoded.rejected = self.encoded.rejected.wrapping_add(1);
            return;
        }

        self.encoded.points.push(DataPoint::new(
            name,
            self.timestamp,
            value,
            statistics,
            unit,
            self.dimensions.clone(),
        ));
    }
}
