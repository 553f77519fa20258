use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    Counter, Error, Gauge, GaugeFloat, Histogram, Meter, Metric, MetricKind, MetricName, Result,
    Timer,
};

/// A set of named metrics.
///
/// Each name maps to exactly one metric. The registry itself is thread-safe and typically
/// shared via `Arc` between the code that records measurements and the code that reports them.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use tally::{Counter, Registry};
///
/// let registry = Registry::new();
///
/// let sent = Arc::new(Counter::new());
/// registry.register("packages_sent", Arc::clone(&sent)).unwrap();
///
/// sent.inc(2);
///
/// // Looking up the same name again yields the same counter.
/// let again = registry.get_or_register_counter("packages_sent").unwrap();
/// assert_eq!(again.count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    metrics: RwLock<BTreeMap<MetricName, Metric>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a metric under the given name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] if the name is empty and [`Error::DuplicateMetric`] if
    /// the name is already taken.
    pub fn register(&self, name: impl Into<MetricName>, metric: impl Into<Metric>) -> Result<()> {
        let name = name.into();

        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        let mut metrics = self.metrics.write();

        if metrics.contains_key(&name) {
            return Err(Error::DuplicateMetric { name });
        }

        metrics.insert(name, metric.into());
        Ok(())
    }

    /// Removes the metric with the given name, returning it if it was registered.
    pub fn unregister(&self, name: &str) -> Option<Metric> {
        self.metrics.write().remove(name)
    }

    /// Returns a handle to the metric with the given name, if one is registered.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics.read().get(name).cloned()
    }

    /// Number of registered metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    /// Whether no metrics are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }

    /// Returns the counter with the given name, registering a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] if the name is empty and [`Error::KindMismatch`] if the
    /// name is taken by a different kind of metric.
    pub fn get_or_register_counter(&self, name: impl Into<MetricName>) -> Result<Arc<Counter>> {
        self.get_or_register(
            name.into(),
            MetricKind::Counter,
            || Metric::Counter(Arc::new(Counter::new())),
            |metric| match metric {
                Metric::Counter(counter) => Some(Arc::clone(counter)),
                _ => None,
            },
        )
    }

    /// Returns the gauge with the given name, registering a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] if the name is empty and [`Error::KindMismatch`] if the
    /// name is taken by a different kind of metric.
    pub fn get_or_register_gauge(&self, name: impl Into<MetricName>) -> Result<Arc<Gauge>> {
        self.get_or_register(
            name.into(),
            MetricKind::Gauge,
            || Metric::Gauge(Arc::new(Gauge::new())),
            |metric| match metric {
                Metric::Gauge(gauge) => Some(Arc::clone(gauge)),
                _ => None,
            },
        )
    }

    /// Returns the floating point gauge with the given name, registering a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] if the name is empty and [`Error::KindMismatch`] if the
    /// name is taken by a different kind of metric.
    pub fn get_or_register_gauge_float(
        &self,
        name: impl Into<MetricName>,
    ) -> Result<Arc<GaugeFloat>> {
        self.get_or_register(
            name.into(),
            MetricKind::GaugeFloat,
            || Metric::GaugeFloat(Arc::new(GaugeFloat::new())),
            |metric| match metric {
                Metric::GaugeFloat(gauge) => Some(Arc::clone(gauge)),
                _ => None,
            },
        )
    }

    /// Returns the histogram with the given name, registering a new one with the default
    /// reservoir size if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] if the name is empty and [`Error::KindMismatch`] if the
    /// name is taken by a different kind of metric.
    pub fn get_or_register_histogram(
        &self,
        name: impl Into<MetricName>,
    ) -> Result<Arc<Histogram>> {
        self.get_or_register(
            name.into(),
            MetricKind::Histogram,
            || Metric::Histogram(Arc::new(Histogram::new())),
            |metric| match metric {
                Metric::Histogram(histogram) => Some(Arc::clone(histogram)),
                _ => None,
            },
        )
    }

    /// Returns the meter with the given name, registering a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] if the name is empty and [`Error::KindMismatch`] if the
    /// name is taken by a different kind of metric.
    pub fn get_or_register_meter(&self, name: impl Into<MetricName>) -> Result<Arc<Meter>> {
        self.get_or_register(
            name.into(),
            MetricKind::Meter,
            || Metric::Meter(Arc::new(Meter::new())),
            |metric| match metric {
                Metric::Meter(meter) => Some(Arc::clone(meter)),
                _ => None,
            },
        )
    }

    /// Returns the timer with the given name, registering a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyName`] if the name is empty and [`Error::KindMismatch`] if the
    /// name is taken by a different kind of metric.
    pub fn get_or_register_timer(&self, name: impl Into<MetricName>) -> Result<Arc<Timer>> {
        self.get_or_register(
            name.into(),
            MetricKind::Timer,
            || Metric::Timer(Arc::new(Timer::new())),
            |metric| match metric {
                Metric::Timer(timer) => Some(Arc::clone(timer)),
                _ => None,
            },
        )
    }

    /// Visits every registered metric in ascending name order.
    ///
    /// The visitor runs without holding the registry lock, so it may itself register or
    /// unregister metrics. Such changes are not reflected in the ongoing visit.
    pub fn each(&self, mut visit: impl FnMut(&str, &Metric)) {
        let entries = self
            .metrics
            .read()
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect::<Vec<_>>();

        for (name, metric) in &entries {
            visit(name, metric);
        }
    }

    fn get_or_register<T>(
        &self,
        name: MetricName,
        expected: MetricKind,
        create: impl FnOnce() -> Metric,
        extract: impl Fn(&Metric) -> Option<Arc<T>>,
    ) -> Result<Arc<T>> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        // Fast path for the common case of the metric already existing.
        if let Some(metric) = self.metrics.read().get(&name) {
            return extract(metric).ok_or_else(|| Error::KindMismatch {
                name: name.clone(),
                expected,
                actual: metric.kind(),
            });
        }

        let mut metrics = self.metrics.write();
        let metric = metrics.entry(name.clone()).or_insert_with(create);

        extract(metric).ok_or_else(|| Error::KindMismatch {
            name,
            expected,
            actual: metric.kind(),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Registry: Send, Sync);

    #[test]
    fn new_registry_is_empty() {
        let registry = Registry::new();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.get("anything").is_none());
    }

    #[test]
    fn get_or_register_returns_same_instance() {
        let registry = Registry::new();

        let first = registry.get_or_register_counter("requests").unwrap();
        let second = registry.get_or_register_counter("requests").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_or_register_rejects_other_kind() {
        let registry = Registry::new();
        registry.get_or_register_timer("latency").unwrap();

        let error = registry.get_or_register_histogram("latency").unwrap_err();

        assert!(matches!(
            error,
            Error::KindMismatch {
                expected: MetricKind::Histogram,
                actual: MetricKind::Timer,
                ..
            }
        ));
    }

    #[test]
    fn register_rejects_duplicate_name() {
        let registry = Registry::new();
        registry
            .register("depth", Arc::new(Gauge::new()))
            .unwrap();

        let error = registry
            .register("depth", Arc::new(Gauge::new()))
            .unwrap_err();

        assert!(matches!(error, Error::DuplicateMetric { .. }));
    }

    #[test]
    fn empty_names_are_rejected() {
        let registry = Registry::new();

        assert!(matches!(
            registry.get_or_register_counter(""),
            Err(Error::EmptyName)
        ));
        assert!(matches!(
            registry.get_or_register_timer(String::new()),
            Err(Error::EmptyName)
        ));
        assert!(matches!(
            registry.register("", Arc::new(Gauge::new())),
            Err(Error::EmptyName)
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_removes_metric() {
        let registry = Registry::new();
        registry.get_or_register_meter("hits").unwrap();

        assert!(registry.unregister("hits").is_some());
        assert!(registry.unregister("hits").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn each_visits_in_name_order() {
        let registry = Registry::new();
        registry.get_or_register_gauge("b").unwrap();
        registry.get_or_register_counter("c").unwrap();
        registry.get_or_register_timer("a").unwrap();

        let mut visited = Vec::new();
        registry.each(|name, metric| visited.push((name.to_owned(), metric.kind())));

        assert_eq!(
            visited,
            vec![
                ("a".to_owned(), MetricKind::Timer),
                ("b".to_owned(), MetricKind::Gauge),
                ("c".to_owned(), MetricKind::Counter),
            ]
        );
    }

    #[test]
    fn each_allows_registration_from_visitor() {
        let registry = Registry::new();
        registry.get_or_register_counter("existing").unwrap();

        registry.each(|_, _| {
            registry.get_or_register_counter("added_during_visit").unwrap();
        });

        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn dynamic_names_are_supported() {
        let registry = Registry::new();

        for i in 0..3 {
            registry
                .get_or_register_counter(format!("worker_{i}_tasks"))
                .unwrap()
                .inc(i);
        }

        let Some(Metric::Counter(counter)) = registry.get("worker_2_tasks") else {
            panic!("expected a counter");
        };
        assert_eq!(counter.count(), 2);
    }
}
