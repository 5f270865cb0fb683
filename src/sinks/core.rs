// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use rand::Rng;
use std::io;
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A sink shared between clients, and between a capture and the sink it
/// forwards to.
pub type SharedMetricSink = Arc<dyn MetricSink + Send + Sync + RefUnwindSafe>;

#[derive(Clone, Debug, Default)]
pub struct SinkStats {
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub bytes_dropped: u64,
    pub packets_dropped: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SocketStats {
    bytes_sent: Arc<AtomicU64>,
    packets_sent: Arc<AtomicU64>,
    bytes_dropped: Arc<AtomicU64>,
    packets_dropped: Arc<AtomicU64>,
}

impl SocketStats {
    pub(crate) fn update(&self, res: io::Result<usize>, len: usize) -> io::Result<usize> {
        match res {
            Ok(written) => {
                self.bytes_sent.fetch_add(written as u64, Ordering::Relaxed);
                self.packets_sent.fetch_add(1, Ordering::Relaxed);
                Ok(written)
            }
            Err(e) => {
                self.bytes_dropped.fetch_add(len as u64, Ordering::Relaxed);
                self.packets_dropped.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }
}

impl From<&SocketStats> for SinkStats {
    fn from(stats: &SocketStats) -> Self {
        SinkStats {
            bytes_sent: stats.bytes_sent.load(Ordering::Relaxed),
            packets_sent: stats.packets_sent.load(Ordering::Relaxed),
            bytes_dropped: stats.bytes_dropped.load(Ordering::Relaxed),
            packets_dropped: stats.packets_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Decide whether an observation at `rate` is kept, using `rng` for the draw.
///
/// A rate of `1.0` or more always keeps, a rate of `0.0` or less (or NaN)
/// always drops.
pub fn sample_with<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> bool {
    if rate >= 1.0 {
        true
    } else if rate > 0.0 {
        rng.gen_bool(rate)
    } else {
        false
    }
}

/// Trait for the delivery and sampling capability a client writes to.
///
/// The datagram text will be in the canonical wire format of the client's
/// dialect, without a trailing newline. Examples of each kind of datagram
/// are given below.
///
/// ## Counter
///
/// ``` text
/// some.counter:1|c
/// ```
///
/// ## Timing
///
/// ``` text
/// some.timer:122.54|ms
/// ```
///
/// ## Gauge
///
/// ``` text
/// some.gauge:5|g
/// ```
///
/// ## Set
///
/// ``` text
/// some.set:2|s
/// ```
///
/// ## Histogram
///
/// ``` text
/// some.histogram:4|h|#host:web01
/// ```
///
/// ## Distribution
///
/// ``` text
/// some.distribution:100.0|d
/// ```
///
/// ## Service check
///
/// ``` text
/// _sc|some.service|0
/// ```
///
/// ## Event
///
/// ``` text
/// _e{7,18}:service|event\ndescription
/// ```
pub trait MetricSink {
    /// Decide, independently for each call, whether an observation at
    /// this sample rate should be delivered.
    ///
    /// The default implementation draws from the thread-local random
    /// number generator. Sinks that record everything (captures, test
    /// sinks) can always return `true`.
    fn sample(&self, rate: f64) -> bool {
        sample_with(&mut rand::thread_rng(), rate)
    }

    /// Deliver one encoded datagram and return the number of bytes
    /// written or an I/O error.
    ///
    /// Note that implementations may return `0` bytes if the datagram is
    /// not immediately written (such as when it is buffered). Callers should
    /// *NOT* interpret this as an error.
    fn emit(&self, metric: &str) -> io::Result<usize>;

    /// Flush any currently buffered datagrams to the underlying backend.
    ///
    /// Note that not all sinks buffer and so the default implementation of
    /// this method does nothing.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Return I/O telemetry like bytes / packets sent or dropped.
    ///
    /// Note that not all sinks implement this method and the default
    /// implementation returns zeros.
    fn stats(&self) -> SinkStats {
        SinkStats::default()
    }
}

impl<T> MetricSink for Arc<T>
where
    T: MetricSink + ?Sized,
{
    fn sample(&self, rate: f64) -> bool {
        (**self).sample(rate)
    }

    fn emit(&self, metric: &str) -> io::Result<usize> {
        (**self).emit(metric)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }

    fn stats(&self) -> SinkStats {
        (**self).stats()
    }
}

/// Implementation of a `MetricSink` that discards all metrics.
///
/// This is the default sink of a client. Useful for disabling metric
/// collection or unit tests.
#[derive(Debug, Clone)]
pub struct NopMetricSink;

impl MetricSink for NopMetricSink {
    fn sample(&self, _rate: f64) -> bool {
        true
    }

    fn emit(&self, _metric: &str) -> io::Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{sample_with, MetricSink, NopMetricSink, SocketStats};
    use crate::sinks::SinkStats;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::io;

    #[test]
    fn test_nop_metric_sink() {
        let sink = NopMetricSink;
        assert!(sink.sample(0.1));
        assert_eq!(0, sink.emit("baz:4|c").unwrap());
    }

    #[test]
    fn test_sample_with_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!(sample_with(&mut rng, 1.0));
        assert!(sample_with(&mut rng, 2.0));
        assert!(!sample_with(&mut rng, 0.0));
        assert!(!sample_with(&mut rng, -1.0));
        assert!(!sample_with(&mut rng, f64::NAN));
    }

    #[test]
    fn test_sample_with_keeps_roughly_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let kept = (0..10_000).filter(|_| sample_with(&mut rng, 0.25)).count();

        assert!(kept > 2_000, "kept {}", kept);
        assert!(kept < 3_000, "kept {}", kept);
    }

    #[test]
    fn test_socket_stats_update() {
        let stats = SocketStats::default();
        let _ = stats.update(Ok(8), 8);
        let _ = stats.update(Err(io::Error::new(io::ErrorKind::Other, "boom")), 5);

        let snapshot = SinkStats::from(&stats);
        assert_eq!(8, snapshot.bytes_sent);
        assert_eq!(1, snapshot.packets_sent);
        assert_eq!(5, snapshot.bytes_dropped);
        assert_eq!(1, snapshot.packets_dropped);
    }
}
