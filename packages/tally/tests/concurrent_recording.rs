//! Integration test for recording into a shared registry from multiple threads while
//! another thread inspects it.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tally::{Metric, Registry};

#[test]
fn registry_is_shared_between_producers_and_a_reader() {
    let registry = Arc::new(Registry::new());

    thread::scope(|s| {
        for worker in 0..4 {
            let registry = Arc::clone(&registry);

            s.spawn(move || {
                let requests = registry.get_or_register_counter("requests").unwrap();
                let sizes = registry.get_or_register_histogram("request_bytes").unwrap();
                let latency = registry.get_or_register_timer("request_latency").unwrap();
                let hits = registry.get_or_register_meter("cache_hits").unwrap();

                for i in 0..250 {
                    requests.inc(1);
                    sizes.update(worker * 1000 + i);
                    latency.update(Duration::from_micros(10));
                    hits.mark(2);
                }
            });
        }

        // Reading concurrently with the producers must be safe. Values are not yet final.
        s.spawn(|| {
            for _ in 0..10 {
                registry.each(|_, metric| {
                    if let Metric::Histogram(histogram) = metric {
                        let snapshot = histogram.snapshot();
                        assert!(snapshot.values().len() <= 1028);
                    }
                });
            }
        });
    });

    let mut seen = Vec::new();

    registry.each(|name, metric| {
        seen.push(name.to_owned());

        match metric {
            Metric::Counter(counter) => assert_eq!(counter.count(), 1000),
            Metric::Histogram(histogram) => {
                let snapshot = histogram.snapshot();
                assert_eq!(snapshot.count(), 1000);
                assert_eq!(snapshot.values().len(), 1000);
                assert_eq!(snapshot.min(), 0);
                assert_eq!(snapshot.max(), 3249);
            }
            Metric::Timer(timer) => {
                let snapshot = timer.snapshot();
                assert_eq!(snapshot.count(), 1000);
                assert_eq!(snapshot.durations().max(), 10_000);
            }
            Metric::Meter(meter) => assert_eq!(meter.count(), 2000),
            other => panic!("unexpected metric {other:?}"),
        }
    });

    assert_eq!(
        seen,
        ["cache_hits", "request_bytes", "request_latency", "requests"]
    );
}
