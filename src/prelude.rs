// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Export commonly used parts of statsd-instrument for easy glob imports
//!
//! # Example
//!
//! ```
//! use statsd_instrument::prelude::*;
//! use statsd_instrument::{Client, NopMetricSink};
//!
//! let client = Client::from_sink("some.prefix", NopMetricSink);
//!
//! client.increment("some.counter").unwrap();
//! client.measure("some.timer", 23).unwrap();
//! client.gauge("some.gauge", 45).unwrap();
//! client.histogram("some.histogram", 89).unwrap();
//! client.service_check("some.service", "ok").unwrap();
//! ```

pub use crate::client::{
    Counted, CountedExt, Distributed, Evented, Gauged, Histogrammed, Measured, MetricClient, ServiceChecked, Setted,
};
