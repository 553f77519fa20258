#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! # tally
//!
//! A thread-safe, in-process registry of named metrics that can be snapshotted at any time
//! and shipped elsewhere by a reporter (see the `tally_report` package).
//!
//! # Metric kinds
//!
//! * [`Counter`] - a signed integer that is incremented and decremented, and may be cleared.
//! * [`Gauge`] - an instantaneous integer reading.
//! * [`GaugeFloat`] - an instantaneous floating point reading.
//! * [`Histogram`] - a distribution of integer values, kept as a uniform random sample.
//! * [`Meter`] - a count of occurrences plus 1/5/15-minute moving average and mean rates.
//! * [`Timer`] - a histogram of durations (in nanoseconds) combined with a meter.
//!
//! # Registering metrics
//!
//! Metrics live in a [`Registry`]. Handles are reference-counted, so you typically look a metric
//! up once and keep the handle around:
//!
//! ```
//! use tally::Registry;
//!
//! let registry = Registry::new();
//!
//! let requests = registry.get_or_register_counter("http_requests").unwrap();
//! requests.inc(1);
//!
//! let latency = registry.get_or_register_histogram("http_latency_ms").unwrap();
//! latency.update(42);
//!
//! assert_eq!(requests.count(), 1);
//! assert_eq!(latency.snapshot().count(), 1);
//! ```
//!
//! There is no process-wide default registry. Create as many independent registries as you
//! need and pass them to whatever reports on them.
//!
//! # Inspecting a registry
//!
//! [`Registry::each()`] visits every registered metric in ascending name order. The visitor
//! receives a [`Metric`], a closed enumeration of the metric kinds, from which a point-in-time
//! snapshot can be read:
//!
//! ```
//! use tally::{Metric, Registry};
//!
//! let registry = Registry::new();
//! registry.get_or_register_gauge("queue_depth").unwrap().update(7);
//!
//! registry.each(|name, metric| {
//!     if let Metric::Gauge(gauge) = metric {
//!         println!("{name} = {}", gauge.value());
//!     }
//! });
//! ```
//!
//! # Mathematics policy
//!
//! Counters and sums wrap on overflow instead of panicking. Do not stray near `i64` boundaries
//! and you should be fine.

mod counter;
mod data_types;
mod error;
mod ewma;
mod gauge;
mod histogram;
mod meter;
mod metric;
mod registry;
mod sample;
mod timer;

pub use counter::*;
pub use data_types::*;
pub use error::*;
pub(crate) use ewma::*;
pub use gauge::*;
pub use histogram::*;
pub use meter::*;
pub use metric::*;
pub use registry::*;
pub use sample::*;
pub use timer::*;
