// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::datagram::Datagram;
use crate::sinks::core::{MetricSink, SharedMetricSink, SinkStats};
use std::fmt;
use std::io;
use std::sync::Mutex;

/// `MetricSink` that records every datagram written to it and then hands
/// it on to an optional parent sink.
///
/// Recorded datagrams keep the order they were written in. A capture sink
/// never drops anything when asked to sample; the sampling decision is made
/// once by the client before a datagram reaches it.
///
/// Captures created by `Client::capture` use the enclosing capture (or the
/// client's own sink) as their parent, so a datagram written inside nested
/// captures is recorded by each of them and then delivered for real.
///
/// # Example
///
/// ```
/// use statsd_instrument::{CaptureSink, MetricSink};
///
/// let sink = CaptureSink::new();
/// sink.emit("foo:1|c").unwrap();
///
/// let datagrams = sink.datagrams();
/// assert_eq!(1, datagrams.len());
/// assert_eq!("foo", datagrams[0].name());
/// ```
#[derive(Default)]
pub struct CaptureSink {
    parent: Option<SharedMetricSink>,
    datagrams: Mutex<Vec<Datagram>>,
}

impl CaptureSink {
    /// Create a capture that only records.
    pub fn new() -> CaptureSink {
        CaptureSink::default()
    }

    /// Create a capture that records and then forwards to `parent`.
    pub fn with_parent(parent: SharedMetricSink) -> CaptureSink {
        CaptureSink {
            parent: Some(parent),
            datagrams: Mutex::new(Vec::new()),
        }
    }

    /// Copy of everything recorded so far, in emission order.
    pub fn datagrams(&self) -> Vec<Datagram> {
        self.datagrams.lock().unwrap().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take_datagrams(&self) -> Vec<Datagram> {
        std::mem::take(&mut *self.datagrams.lock().unwrap())
    }

    pub fn clear(&self) {
        self.datagrams.lock().unwrap().clear();
    }
}

impl fmt::Debug for CaptureSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSink")
            .field("parent", &self.parent.as_ref().map(|_| ".."))
            .field("datagrams", &self.datagrams)
            .finish()
    }
}

impl MetricSink for CaptureSink {
    fn sample(&self, _rate: f64) -> bool {
        true
    }

    fn emit(&self, metric: &str) -> io::Result<usize> {
        let parsed = Datagram::parse(metric);
        if let Ok(ref datagram) = parsed {
            self.datagrams.lock().unwrap().push(datagram.clone());
        }

        let written = match self.parent {
            Some(ref parent) => parent.emit(metric)?,
            None => metric.len(),
        };

        match parsed {
            Ok(_) => Ok(written),
            Err(err) => Err(io::Error::new(io::ErrorKind::InvalidData, err)),
        }
    }

    fn flush(&self) -> io::Result<()> {
        match self.parent {
            Some(ref parent) => parent.flush(),
            None => Ok(()),
        }
    }

    fn stats(&self) -> SinkStats {
        match self.parent {
            Some(ref parent) => parent.stats(),
            None => SinkStats::default(),
        }
    }
}
