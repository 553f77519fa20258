use thiserror::Error;

use crate::{MetricKind, MetricName};

/// Errors that can occur when registering metrics.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Metric names must not be empty.
    #[error("metric names must not be empty")]
    EmptyName,

    /// A metric with the same name is already registered.
    #[error("a metric named '{name}' is already registered")]
    DuplicateMetric {
        /// The name that was already taken.
        name: MetricName,
    },

    /// A metric with the requested name exists but is of a different kind than requested.
    #[error("metric '{name}' is a {actual}, not a {expected}")]
    KindMismatch {
        /// The name of the metric.
        name: MetricName,

        /// The kind the caller asked for.
        expected: MetricKind,

        /// The kind that is actually registered under this name.
        actual: MetricKind,
    },
}

/// A specialized `Result` type for registry operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
