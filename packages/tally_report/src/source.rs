use std::sync::Arc;

use tally::{Metric, Registry};

/// Anything that can enumerate named metrics for a reporting cycle.
///
/// The reporter only reads from the source, except for clearing counters when configured to
/// reset them on report. [`Registry`] is the usual implementation; a custom source can merge
/// several registries or expose a filtered view of one.
pub trait MetricSource: Send + Sync {
    /// Visits every metric of the source once. The iteration order is the order in which
    /// data points are reported.
    fn each(&self, visit: &mut dyn FnMut(&str, &Metric));
}

impl MetricSource for Registry {
    #[cfg_attr(test, mutants::skip)] // Pass-through.
    fn each(&self, visit: &mut dyn FnMut(&str, &Metric)) {
        Self::each(self, |name, metric| visit(name, metric));
    }
}

impl<S> MetricSource for Arc<S>
where
    S: MetricSource + ?Sized,
{
    #[cfg_attr(test, mutants::skip)] // Pass-through.
    fn each(&self, visit: &mut dyn FnMut(&str, &Metric)) {
        (**self).each(visit);
    }
}

impl<S> MetricSource for &S
where
    S: MetricSource + ?Sized,
{
    #[cfg_attr(test, mutants::skip)] // Pass-through.
    fn each(&self, visit: &mut dyn FnMut(&str, &Metric)) {
        (**self).each(visit);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Registry: MetricSource);
    assert_impl_all!(Arc<Registry>: MetricSource);

    #[test]
    fn registry_source_visits_all_metrics() {
        let registry = Registry::new();
        registry.get_or_register_counter("b").unwrap();
        registry.get_or_register_gauge("a").unwrap();

        let source: Arc<dyn MetricSource> = Arc::new(registry);

        let mut names = Vec::new();
        source.each(&mut |name, _| names.push(name.to_owned()));

        assert_eq!(names, ["a", "b"]);
    }
}
