use std::fmt::{self, Display};
use std::sync::Arc;

use crate::{Counter, Gauge, GaugeFloat, Histogram, Meter, Timer};

/// A handle to any kind of registered metric.
///
/// Cloning a `Metric` clones the handle, not the data - both handles refer to the same metric.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Metric {
    /// See [`Counter`].
    Counter(Arc<Counter>),

    /// See [`Gauge`].
    Gauge(Arc<Gauge>),

    /// See [`GaugeFloat`].
    GaugeFloat(Arc<GaugeFloat>),

    /// See [`Histogram`].
    Histogram(Arc<Histogram>),

    /// See [`Meter`].
    Meter(Arc<Meter>),

    /// See [`Timer`].
    Timer(Arc<Timer>),
}

impl Metric {
    /// The kind of metric behind this handle.
    #[must_use]
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Counter(_) => MetricKind::Counter,
            Self::Gauge(_) => MetricKind::Gauge,
            Self::GaugeFloat(_) => MetricKind::GaugeFloat,
            Self::Histogram(_) => MetricKind::Histogram,
            Self::Meter(_) => MetricKind::Meter,
            Self::Timer(_) => MetricKind::Timer,
        }
    }
}

impl From<Arc<Counter>> for Metric {
    fn from(value: Arc<Counter>) -> Self {
        Self::Counter(value)
    }
}

impl From<Arc<Gauge>> for Metric {
    fn from(value: Arc<Gauge>) -> Self {
        Self::Gauge(value)
    }
}

impl From<Arc<GaugeFloat>> for Metric {
    fn from(value: Arc<GaugeFloat>) -> Self {
        Self::GaugeFloat(value)
    }
}

impl From<Arc<Histogram>> for Metric {
    fn from(value: Arc<Histogram>) -> Self {
        Self::Histogram(value)
    }
}

impl From<Arc<Meter>> for Metric {
    fn from(value: Arc<Meter>) -> Self {
        Self::Meter(value)
    }
}

impl From<Arc<Timer>> for Metric {
    fn from(value: Arc<Timer>) -> Self {
        Self::Timer(value)
    }
}

/// The kinds of metric a [`Registry`][crate::Registry] can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum MetricKind {
    /// See [`Counter`].
    Counter,

    /// See [`Gauge`].
    Gauge,

    /// See [`GaugeFloat`].
    GaugeFloat,

    /// See [`Histogram`].
    Histogram,

    /// See [`Meter`].
    Meter,

    /// See [`Timer`].
    Timer,
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::GaugeFloat => "floating point gauge",
            Self::Histogram => "histogram",
            Self::Meter => "meter",
            Self::Timer => "timer",
        };

        f.write_str(name)
    }
}
