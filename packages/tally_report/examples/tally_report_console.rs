//! Stand-alone example showcasing `tally_report` functionality.
//!
//! This example demonstrates how to:
//! 1. Register metrics of every kind in a shared registry
//! 2. Perform fake work in a loop that records into them
//! 3. Report the metrics every 5 seconds
//! 4. Use the log transmitter to see the data points on the console

use std::sync::Arc;
use std::time::Duration;

use tally::Registry;
use tally_report::{AcceptAll, DropZeros, reporter};
use tracing::Level;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Exit early if running in a testing environment.
    if std::env::var("IS_TESTING").is_ok() {
        println!("Running in testing mode - exiting immediately to prevent infinite loop");
        return;
    }

    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let registry = Arc::new(Registry::new());

    // Start the reporter in a separate task.
    let mut reporter = reporter(Arc::clone(&registry))
        .interval(Duration::from_secs(5))
        .namespace("tally_report_console")
        .dimension("host", "localhost")
        .reset_counters_on_report(true)
        .filter(DropZeros::new(AcceptAll))
        .build();

    tokio::spawn(async move {
        reporter.report_forever().await;
    });

    println!("Starting fake work loop. Press Ctrl+C to exit.");
    println!("Metrics will be reported every 5 seconds.");
    println!();

    let mut iteration: u64 = 0;

    loop {
        perform_fake_work(&registry, iteration);
        iteration = iteration.wrapping_add(1);

        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

fn perform_fake_work(registry: &Registry, iteration: u64) {
    let items = registry
        .get_or_register_counter("work_items_processed")
        .expect("name is only used for a counter");
    let queue_depth = registry
        .get_or_register_gauge("queue_depth")
        .expect("name is only used for a gauge");
    let bytes = registry
        .get_or_register_histogram("bytes_processed")
        .expect("name is only used for a histogram");
    let arrivals = registry
        .get_or_register_meter("arrivals")
        .expect("name is only used for a meter");
    let latency = registry
        .get_or_register_timer("work_duration")
        .expect("name is only used for a timer");

    let step = i64::try_from(iteration % 97).expect("always fits");

    items.inc(3);
    arrivals.mark(3);
    queue_depth.update(step % 10);
    bytes.update(step.wrapping_mul(39).wrapping_add(100));

    let micros = u64::try_from(step.wrapping_add(10)).expect("always positive");
    latency.update(Duration::from_micros(micros));
}
