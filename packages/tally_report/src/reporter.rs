use std::future::Future;
use std::iter;
use std::num::NonZero;
use std::pin::pin;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::{
    AcceptAll, Clock, DEFAULT_MAX_CHUNK_SIZE, Dimensions, Filter, LogTransmitter, MetricSource,
    RealClock, Transmit, batch, encode,
};

/// How often a reporter runs a cycle unless configured otherwise.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Settings that stay fixed for the lifetime of a reporter.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use tally_report::ReportingConfig;
///
/// let config = ReportingConfig::default()
///     .with_interval(Duration::from_secs(10))
///     .with_namespace("checkout")
///     .with_reset_counters_on_report(true);
///
/// assert_eq!(config.namespace(), "checkout");
/// assert_eq!(config.max_chunk_size().get(), 20);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportingConfig {
    interval: Duration,
    namespace: String,
    dimensions: Dimensions,
    reset_counters_on_report: bool,
    max_chunk_size: NonZero<usize>,
}

impl ReportingConfig {
    /// The time between the end of one cycle and the start of the next.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The namespace every chunk is tagged with.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The dimensions attached to every data point.
    #[must_use]
    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    /// Whether counters are cleared after being read for a cycle.
    #[must_use]
    pub fn reset_counters_on_report(&self) -> bool {
        self.reset_counters_on_report
    }

    /// The most data points sent in one transmission.
    #[must_use]
    pub fn max_chunk_size(&self) -> NonZero<usize> {
        self.max_chunk_size
    }

    /// Sets the time between cycles.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the namespace every chunk is tagged with.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Replaces the dimensions attached to every data point.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets whether counters are cleared after being read for a cycle.
    #[must_use]
    pub fn with_reset_counters_on_report(mut self, reset: bool) -> Self {
        self.reset_counters_on_report = reset;
        self
    }

    /// Sets the most data points sent in one transmission.
    #[must_use]
    pub fn with_max_chunk_size(mut self, max_chunk_size: NonZero<usize>) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            namespace: String::new(),
            dimensions: Dimensions::empty(),
            reset_counters_on_report: false,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

/// Starts building a [`Reporter`] for the metrics of `source`.
///
/// Unless configured otherwise, the reporter accepts every data point, writes them to the
/// `tracing` log and runs a cycle every 60 seconds.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use tally::Registry;
/// use tally_report::reporter;
///
/// # async fn example() {
/// let registry = Arc::new(Registry::new());
///
/// let requests = registry.get_or_register_counter("requests").unwrap();
/// requests.inc(1);
///
/// reporter(Arc::clone(&registry))
///     .interval(Duration::from_secs(10))
///     .namespace("checkout")
///     .dimension("region", "eu-west-1")
///     .build()
///     .report_forever()
///     .await;
/// # }
/// ```
#[must_use]
pub fn reporter<S>(source: S) -> ReporterBuilder<S, AcceptAll, LogTransmitter, RealClock>
where
    S: MetricSource,
{
    ReporterBuilder {
        source,
        filter: AcceptAll,
        transmitter: LogTransmitter,
        clock: RealClock,
        config: ReportingConfig::default(),
    }
}

/// Configures a [`Reporter`]. Created by [`reporter()`].
#[derive(Debug)]
pub struct ReporterBuilder<S, F, T, C> {
    source: S,
    filter: F,
    transmitter: T,
    clock: C,
    config: ReportingConfig,
}

impl<S, F, T, C> ReporterBuilder<S, F, T, C>
where
    S: MetricSource,
    F: Filter,
    T: Transmit,
    C: Clock,
{
    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ReportingConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the time between cycles.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config = self.config.with_interval(interval);
        self
    }

    /// Sets the namespace every chunk is tagged with.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config = self.config.with_namespace(namespace);
        self
    }

    /// Adds one dimension, replacing any earlier value for the same key.
    #[must_use]
    pub fn dimension(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let dimensions = self
            .config
            .dimensions()
            .iter()
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .chain(iter::once((key.into(), value.into())))
            .collect();

        self.config = self.config.with_dimensions(dimensions);
        self
    }

    /// Replaces all dimensions.
    #[must_use]
    pub fn dimensions(mut self, dimensions: Dimensions) -> Self {
        self.config = self.config.with_dimensions(dimensions);
        self
    }

    /// Sets whether counters are cleared after being read for a cycle.
    #[must_use]
    pub fn reset_counters_on_report(mut self, reset: bool) -> Self {
        self.config = self.config.with_reset_counters_on_report(reset);
        self
    }

    /// Sets the most data points sent in one transmission.
    #[must_use]
    pub fn max_chunk_size(mut self, max_chunk_size: NonZero<usize>) -> Self {
        self.config = self.config.with_max_chunk_size(max_chunk_size);
        self
    }

    /// Sets the filter that decides which data points are reported.
    #[must_use]
    pub fn filter<F2>(self, filter: F2) -> ReporterBuilder<S, F2, T, C>
    where
        F2: Filter,
    {
        ReporterBuilder {
            source: self.source,
            filter,
            transmitter: self.transmitter,
            clock: self.clock,
            config: self.config,
        }
    }

    /// Sets where data points are sent.
    #[must_use]
    pub fn transmitter<T2>(self, transmitter: T2) -> ReporterBuilder<S, F, T2, C>
    where
        T2: Transmit,
    {
        ReporterBuilder {
            source: self.source,
            filter: self.filter,
            transmitter,
            clock: self.clock,
            config: self.config,
        }
    }

    /// Sets the clock used for timestamps and for waiting between cycles.
    #[must_use]
    pub fn clock<C2>(self, clock: C2) -> ReporterBuilder<S, F, T, C2>
    where
        C2: Clock,
    {
        ReporterBuilder {
            source: self.source,
            filter: self.filter,
            transmitter: self.transmitter,
            clock,
            config: self.config,
        }
    }

    /// Creates the reporter. Nothing runs until one of its reporting methods is awaited.
    #[must_use]
    pub fn build(self) -> Reporter<S, F, T, C> {
        Reporter {
            source: self.source,
            filter: self.filter,
            transmitter: self.transmitter,
            clock: self.clock,
            config: self.config,
            cycles: 0,
        }
    }
}

/// Periodically ships the metrics of a source to a backend.
///
/// Each cycle reads every metric, encodes it into data points, drops the data points the
/// filter rejects, splits the rest into chunks and sends the chunks one after another. A chunk
/// that fails to send is logged and skipped; the cycle continues with the next chunk.
///
/// Cycles never overlap. The wait for the next cycle starts only after the previous cycle
/// has finished, so a slow backend delays the schedule instead of piling up work.
///
/// Create one with [`reporter()`].
#[derive(Debug)]
pub struct Reporter<S, F, T, C> {
    source: S,
    filter: F,
    transmitter: T,
    clock: C,
    config: ReportingConfig,

    // Cycles started so far.
    cycles: u64,
}

impl<S, F, T, C> Reporter<S, F, T, C>
where
    S: MetricSource,
    F: Filter,
    T: Transmit,
    C: Clock,
{
    /// The configuration the reporter was built with.
    #[must_use]
    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    /// Runs one full cycle immediately, without waiting for the interval.
    ///
    /// All data points of the cycle carry the same timestamp, read from the clock once at the
    /// start of the cycle.
    pub async fn run_one_cycle(&mut self) -> CycleSummary {
        self.cycles = self.cycles.wrapping_add(1);

        let timestamp = self.clock.now();
        let encoded = encode(&self.source, &self.filter, &self.config, timestamp);
        let rejected = encoded.rejected();
        let points = encoded.into_points();

        let mut summary = CycleSummary {
            cycle: self.cycles,
            encoded: points.len(),
            rejected,
            ..CycleSummary::default()
        };

        for chunk in batch::chunks(&points, self.config.max_chunk_size()) {
            match self.transmitter.send(self.config.namespace(), chunk).await {
                Ok(accepted) => {
                    summary.chunks_sent = summary.chunks_sent.wrapping_add(1);
                    summary.points_sent = summary.points_sent.wrapping_add(accepted);

                    trace!(
                        cycle = summary.cycle,
                        points = chunk.len(),
                        accepted,
                        "sent chunk"
                    );
                }
                Err(error) => {
                    summary.chunks_failed = summary.chunks_failed.wrapping_add(1);

                    warn!(
                        cycle = summary.cycle,
                        points = chunk.len(),
                        %error,
                        "failed to send chunk of data points; skipping it"
                    );
                }
            }
        }

        debug!(
            cycle = summary.cycle,
            encoded = summary.encoded,
            rejected = summary.rejected,
            chunks_sent = summary.chunks_sent,
            chunks_failed = summary.chunks_failed,
            "reporting cycle finished"
        );

        summary
    }

    /// Reports forever: waits for the interval, runs a cycle, and repeats.
    ///
    /// This future never completes. Drop it to stop reporting, or use
    /// [`report_until()`][Self::report_until] to stop only between cycles.
    pub async fn report_forever(&mut self) -> ! {
        loop {
            self.clock.sleep(self.config.interval()).await;
            self.run_one_cycle().await;
        }
    }

    /// Reports like [`report_forever()`][Self::report_forever] until `stop` completes.
    ///
    /// `stop` is only observed while waiting for the next cycle. A cycle that is already
    /// running when `stop` completes finishes first, including all of its transmissions.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use tally::Registry;
    /// use tally_report::reporter;
    /// use tokio::sync::oneshot;
    ///
    /// # async fn example() {
    /// let (stop_tx, stop_rx) = oneshot::channel::<()>();
    ///
    /// let task = tokio::spawn(async move {
    ///     let mut reporter = reporter(Registry::new()).build();
    ///     reporter
    ///         .report_until(async {
    ///             _ = stop_rx.await;
    ///         })
    ///         .await;
    /// });
    ///
    /// // Later, during shutdown.
    /// _ = stop_tx.send(());
    /// task.await.unwrap();
    /// # }
    /// ```
    pub async fn report_until(&mut self, stop: impl Future<Output = ()>) {
        let mut stop = pin!(stop);

        loop {
            tokio::select! {
                biased;
                () = &mut stop => break,
                () = self.clock.sleep(self.config.interval()) => {}
            }

            self.run_one_cycle().await;
        }

        debug!(cycles = self.cycles, "reporter stopped");
    }
}

/// What happened during one reporting cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    cycle: u64,
    encoded: usize,
    rejected: usize,
    chunks_sent: usize,
    chunks_failed: usize,
    points_sent: usize,
}

impl CycleSummary {
    /// The sequence number of the cycle, starting from 1.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// How many data points passed the filter.
    #[must_use]
    pub fn encoded(&self) -> usize {
        self.encoded
    }

    /// How many candidate data points the filter rejected.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// How many chunks were sent successfully.
    #[must_use]
    pub fn chunks_sent(&self) -> usize {
        self.chunks_sent
    }

    /// How many chunks failed to send.
    #[must_use]
    pub fn chunks_failed(&self) -> usize {
        self.chunks_failed
    }

    /// How many data points the backend accepted.
    #[must_use]
    pub fn points_sent(&self) -> usize {
        self.points_sent
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;

    use tally::Registry;

    use super::*;
    use crate::{FakeClock, RecordingTransmitter, RejectAll};

    #[test]
    fn default_config() {
        let config = ReportingConfig::default();

        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.namespace(), "");
        assert!(config.dimensions().is_empty());
        assert!(!config.reset_counters_on_report());
        assert_eq!(config.max_chunk_size().get(), 20);
    }

    #[test]
    fn builder_applies_settings() {
        let reporter = reporter(Registry::new())
            .interval(Duration::from_secs(5))
            .namespace("app")
            .dimension("host", "web-1")
            .dimension("env", "prod")
            .dimension("host", "web-2")
            .reset_counters_on_report(true)
            .max_chunk_size(NonZero::new(7).unwrap())
            .build();

        let config = reporter.config();
        assert_eq!(config.interval(), Duration::from_secs(5));
        assert_eq!(config.namespace(), "app");
        assert_eq!(
            config.dimensions().iter().collect::<Vec<_>>(),
            [("env", "prod"), ("host", "web-2")]
        );
        assert!(config.reset_counters_on_report());
        assert_eq!(config.max_chunk_size().get(), 7);
    }

    #[tokio::test]
    async fn cycle_numbers_increase() {
        let mut reporter = reporter(Registry::new())
            .transmitter(RecordingTransmitter::new())
            .build();

        assert_eq!(reporter.run_one_cycle().await.cycle(), 1);
        assert_eq!(reporter.run_one_cycle().await.cycle(), 2);
    }

    #[tokio::test]
    async fn empty_source_sends_nothing() {
        let transmitter = Arc::new(RecordingTransmitter::new());

        let mut reporter = reporter(Registry::new())
            .transmitter(Arc::clone(&transmitter))
            .build();

        let summary = reporter.run_one_cycle().await;

        assert_eq!(summary.encoded(), 0);
        assert_eq!(summary.chunks_sent(), 0);
        assert_eq!(transmitter.call_count(), 0);
    }

    #[tokio::test]
    async fn summary_counts_chunks_and_points() {
        let registry = Registry::new();
        for i in 0..5 {
            registry.get_or_register_counter(format!("c{i}")).unwrap().inc(1);
        }

        let transmitter = Arc::new(RecordingTransmitter::new().fail_call(1));

        let mut reporter = reporter(registry)
            .max_chunk_size(NonZero::new(2).unwrap())
            .transmitter(Arc::clone(&transmitter))
            .build();

        let summary = reporter.run_one_cycle().await;

        assert_eq!(summary.encoded(), 5);
        assert_eq!(summary.chunks_sent(), 2);
        assert_eq!(summary.chunks_failed(), 1);
        assert_eq!(summary.points_sent(), 3);
        assert_eq!(transmitter.call_count(), 3);
    }

    #[tokio::test]
    async fn rejected_points_are_counted() {
        let registry = Registry::new();
        registry.get_or_register_gauge("g").unwrap();

        let mut reporter = reporter(registry)
            .filter(RejectAll)
            .transmitter(RecordingTransmitter::new())
            .build();

        let summary = reporter.run_one_cycle().await;

        assert_eq!(summary.encoded(), 0);
        assert_eq!(summary.rejected(), 1);
    }

    #[tokio::test]
    async fn namespace_is_passed_to_transmitter() {
        let registry = Registry::new();
        registry.get_or_register_gauge("g").unwrap();

        let transmitter = Arc::new(RecordingTransmitter::new());

        let mut reporter = reporter(registry)
            .namespace("checkout")
            .transmitter(Arc::clone(&transmitter))
            .build();

        reporter.run_one_cycle().await;

        assert_eq!(transmitter.calls()[0].namespace(), "checkout");
    }

    #[tokio::test(start_paused = true)]
    async fn report_until_sleeps_before_each_cycle() {
        let registry = Registry::new();
        registry.get_or_register_gauge("g").unwrap();

        let clock = FakeClock::default();
        let transmitter = Arc::new(RecordingTransmitter::new());

        let mut reporter = reporter(registry)
            .interval(Duration::from_secs(10))
            .clock(clock.clone())
            .transmitter(Arc::clone(&transmitter))
            .build();

        reporter
            .report_until(tokio::time::sleep(Duration::from_secs(35)))
            .await;

        // Cycles after 10, 20 and 30 seconds; the stop arrives during the fourth wait.
        assert_eq!(transmitter.call_count(), 3);
        assert_eq!(clock.sleep_count(), 3);
        assert_eq!(clock.total_sleep_duration(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn report_until_with_immediate_stop_runs_no_cycle() {
        let transmitter = Arc::new(RecordingTransmitter::new());

        let mut reporter = reporter(Registry::new())
            .transmitter(Arc::clone(&transmitter))
            .build();

        reporter.report_until(async {}).await;

        assert_eq!(transmitter.call_count(), 0);
    }
}
