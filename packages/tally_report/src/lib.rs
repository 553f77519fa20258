#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! # `tally_report` - periodic shipping of tally metrics
//!
//! This crate takes the metrics held in a [`tally::Registry`] and periodically ships them to
//! a remote telemetry backend as named, timestamped, dimensioned data points.
//!
//! # How a reporting cycle works
//!
//! Every interval, a [`Reporter`] runs one cycle:
//!
//! 1. Every metric of the source is read and [encoded][encode()] into data points. Histograms
//!    and timers become one data point per percentile, meters become a count plus four rates.
//! 2. Each candidate data point is checked by the [`Filter`]. Rejected points are dropped.
//! 3. The remaining points are split into [chunks][batch::chunks] of at most 20 points, the
//!    most the backend accepts in one request.
//! 4. Each chunk is handed to the [`Transmit`] implementation. A chunk that fails to send is
//!    logged and skipped. There are no retries.
//!
//! Cycles never overlap and nothing a cycle does can stop the reporter.
//!
//! # Basic usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tally::Registry;
//! use tally_report::{AcceptAll, DropZeros, reporter};
//!
//! # async fn example() {
//! let registry = Arc::new(Registry::new());
//!
//! // Record measurements anywhere in the app through the shared registry.
//! registry.get_or_register_counter("orders_placed").unwrap().inc(1);
//!
//! reporter(Arc::clone(&registry))
//!     .interval(Duration::from_secs(30))
//!     .namespace("checkout")
//!     .dimension("region", "eu-west-1")
//!     .reset_counters_on_report(true)
//!     .filter(DropZeros::new(AcceptAll))
//!     .build()
//!     .report_forever()
//!     .await;
//! # }
//! ```
//!
//! The default transmitter, [`LogTransmitter`], writes data points to the `tracing` log.
//! Connect a real backend by implementing [`Transmit`].
//!
//! # Running a single cycle
//!
//! [`Reporter::run_one_cycle()`] runs one cycle immediately and returns a [`CycleSummary`],
//! which is handy for flushing metrics at shutdown:
//!
//! ```
//! use tally::Registry;
//! use tally_report::reporter;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let registry = Registry::new();
//! registry.get_or_register_gauge("queue_depth").unwrap().update(12);
//!
//! let mut reporter = reporter(registry).build();
//! let summary = reporter.run_one_cycle().await;
//!
//! assert_eq!(summary.encoded(), 1);
//! assert_eq!(summary.chunks_sent(), 1);
//! # }
//! ```
//!
//! # Testing
//!
//! The `test-util` feature exposes `RecordingTransmitter` and `FakeClock` for testing code
//! that configures reporters.

pub mod batch;
mod clock;
mod data_point;
mod encode;
mod error;
mod filter;
mod reporter;
mod source;
mod transmit;

pub use batch::DEFAULT_MAX_CHUNK_SIZE;
pub use clock::*;
pub use data_point::*;
pub use encode::{Encoded, encode};
pub use error::*;
pub use filter::*;
pub use reporter::*;
pub use source::*;
pub use transmit::*;
