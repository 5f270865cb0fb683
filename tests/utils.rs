use statsd_instrument::prelude::*;
use statsd_instrument::{Client, MetricResult};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[allow(dead_code)]
pub const NUM_THREADS: u64 = 20;
#[allow(dead_code)]
pub const NUM_ITERATIONS: u64 = 100;

/// Write one of each plain Statsd metric.
#[allow(dead_code)]
pub fn write_statsd_metrics(client: &Client, i: u64) -> MetricResult<()> {
    client.count("some.counter", i as i64)?;
    client.measure("some.timer", i)?;
    client.measure("some.timer", Duration::from_millis(i))?;
    client.gauge("some.gauge", i as i64)?;
    client.gauge("some.gauge", i as f64)?;
    client.set("some.set", i as i64)?;
    Ok(())
}

#[allow(dead_code)]
pub fn run_arc_threaded_test(client: Client, num_threads: u64, iterations: u64) {
    let shared_client = Arc::new(client);

    let threads: Vec<_> = (0..num_threads)
        .map(|_| {
            let local_client = Arc::clone(&shared_client);

            thread::spawn(move || {
                for i in 0..iterations {
                    write_statsd_metrics(&local_client, i).unwrap();
                    local_client.histogram("some.histogram", i).unwrap();
                    local_client.distribution("some.distribution", i).unwrap();
                    thread::sleep(Duration::from_millis(1));
                }
            })
        })
        .collect();

    for t in threads {
        t.join().unwrap();
    }
}
