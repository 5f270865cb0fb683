// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Extension points for the statsd-instrument library
//!
//! Code that needs more control over how datagrams are rendered, or that
//! wants to accept values generically in the same way the client does, can
//! make use of these.

pub use crate::builder::{
    DatagramBuilder, DogStatsdDatagramBuilder, EventOptions, MetricValue, ServiceCheckOptions,
    StatsdDatagramBuilder, Tag, ToCounterValue, ToDistributionValue, ToGaugeValue, ToHistogramValue,
    ToServiceCheckStatus, ToSetValue, ToTimerValue,
};
pub use crate::sinks::{sample_with, SharedMetricSink};
