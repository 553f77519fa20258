use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use crate::{DataPoint, TransmitError};

/// Sends chunks of data points to a telemetry backend.
///
/// Each call is one request carrying at most the configured maximum number of data points.
/// Implementations report failure through the returned error and never retry on their own;
/// the reporter logs the failure and moves on to the next chunk.
///
/// # Example
///
/// ```
/// use tally_report::{DataPoint, Transmit, TransmitError};
///
/// /// Prints every data point to stdout.
/// #[derive(Debug)]
/// struct Stdout;
///
/// impl Transmit for Stdout {
///     async fn send(&self, namespace: &str, points: &[DataPoint]) -> Result<usize, TransmitError> {
///         for point in points {
///             println!("{namespace}/{} = {} {}", point.name(), point.value(), point.unit());
///         }
///
///         Ok(points.len())
///     }
/// }
/// ```
pub trait Transmit: Send + Sync {
    /// Sends one chunk of data points tagged with `namespace`, returning how many points the
    /// backend accepted.
    fn send(
        &self,
        namespace: &str,
        points: &[DataPoint],
    ) -> impl Future<Output = Result<usize, TransmitError>> + Send;
}

impl<T> Transmit for Arc<T>
where
    T: Transmit,
{
    #[cfg_attr(test, mutants::skip)] // Pass-through.
    fn send(
        &self,
        namespace: &str,
        points: &[DataPoint],
    ) -> impl Future<Output = Result<usize, TransmitError>> + Send {
        (**self).send(namespace, points)
    }
}

/// Writes data points to the `tracing` log instead of a remote backend.
///
/// Each chunk is logged at `info` level and each data point at `debug` level. Sending always
/// succeeds. This is the default transmitter of a reporter, convenient during local
/// development.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogTransmitter;

impl Transmit for LogTransmitter {
    #[cfg_attr(test, mutants::skip)] // Only produces log output.
    async fn send(&self, namespace: &str, points: &[DataPoint]) -> Result<usize, TransmitError> {
        info!(namespace, points = points.len(), "sending data points");

        for point in points {
            debug!(
                namespace,
                name = point.name(),
                value = point.value(),
                unit = %point.unit(),
                "data point"
            );
        }

        Ok(points.len())
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use recording::*;

#[cfg(any(test, feature = "test-util"))]
mod recording {
    use foldhash::HashSet;
    use parking_lot::Mutex;

    use super::*;

    /// One call made to a [`RecordingTransmitter`].
    #[derive(Clone, Debug, PartialEq)]
    pub struct RecordedCall {
        namespace: String,
        points: Vec<DataPoint>,
        succeeded: bool,
    }

    impl RecordedCall {
        /// The namespace the chunk was tagged with.
        #[must_use]
        pub fn namespace(&self) -> &str {
            &self.namespace
        }

        /// The data points of the chunk.
        #[must_use]
        pub fn points(&self) -> &[DataPoint] {
            &self.points
        }

        /// Whether the call returned success.
        #[must_use]
        pub fn succeeded(&self) -> bool {
            self.succeeded
        }
    }

    /// Test double that records every chunk it is asked to send.
    ///
    /// Calls are numbered from zero across the lifetime of the transmitter. Calls marked with
    /// [`fail_call()`][Self::fail_call] return [`TransmitError::Rejected`] but are still
    /// recorded.
    ///
    /// Share it with a reporter through an `Arc` to inspect the calls afterwards.
    #[derive(Debug, Default)]
    pub struct RecordingTransmitter {
        calls: Mutex<Vec<RecordedCall>>,
        failing_calls: HashSet<usize>,
    }

    impl RecordingTransmitter {
        /// Creates a transmitter for which every call succeeds.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the call with the given zero-based index fail.
        #[must_use]
        pub fn fail_call(mut self, index: usize) -> Self {
            self.failing_calls.insert(index);
            self
        }

        /// All calls made so far, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().clone()
        }

        /// How many calls were made so far, whether they succeeded or not.
        #[must_use]
        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        /// The data points of all successful calls, in order.
        #[must_use]
        pub fn points_sent(&self) -> Vec<DataPoint> {
            self.calls
                .lock()
                .iter()
                .filter(|call| call.succeeded)
                .flat_map(|call| call.points.iter().cloned())
                .collect()
        }
    }

    impl Transmit for RecordingTransmitter {
        async fn send(
            &self,
            namespace: &str,
            points: &[DataPoint],
        ) -> Result<usize, TransmitError> {
            let mut calls = self.calls.lock();

            let index = calls.len();
            let succeeded = !self.failing_calls.contains(&index);

            calls.push(RecordedCall {
                namespace: namespace.to_owned(),
                points: points.to_vec(),
                succeeded,
            });

            if succeeded {
                Ok(points.len())
            } else {
                Err(TransmitError::rejected(format!(
                    "call {index} was configured to fail"
                )))
            }
        }
    }
}
