// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::{ErrorKind, MetricError, MetricResult, ServiceCheckStatus};
use std::fmt;
use std::time::Duration;

/// Holder for primitive metric values that knows how to render itself.
///
/// Integers render without a fraction (`1`), floats always render with
/// one (`100.0`, `122.54`) using the shortest text that round-trips.
///
/// Typical use of this crate shouldn't require interacting with this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl MetricValue {
    pub(crate) fn write_to(&self, out: &mut String) {
        match *self {
            MetricValue::Signed(v) => out.push_str(itoa::Buffer::new().format(v)),
            MetricValue::Unsigned(v) => out.push_str(itoa::Buffer::new().format(v)),
            MetricValue::Float(v) => out.push_str(ryu::Buffer::new().format(v)),
        }
    }

    /// Milliseconds elapsed, as reported by timings and latency measurements.
    pub(crate) fn from_duration(duration: Duration) -> MetricValue {
        MetricValue::Float(duration.as_secs_f64() * 1000.0)
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_to(&mut out);
        f.write_str(&out)
    }
}

fn finite(v: f64) -> MetricResult<MetricValue> {
    if v.is_finite() {
        Ok(MetricValue::Float(v))
    } else {
        Err(MetricError::from((
            ErrorKind::InvalidArgument,
            "Metric values must be finite numbers",
        )))
    }
}

/// Conversion trait for valid values for counters
///
/// This trait is internal to how values are formatted as part of metrics
/// but is exposed publicly for documentation purposes.
pub trait ToCounterValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToCounterValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

/// Conversion trait for valid values for gauges (`i64` and `f64`)
pub trait ToGaugeValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToGaugeValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

impl ToGaugeValue for f64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        finite(self)
    }
}

/// Conversion trait for valid values for sets
pub trait ToSetValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

impl ToSetValue for i64 {
    fn try_to_value(self) -> MetricResult<MetricValue> {
        Ok(MetricValue::Signed(self))
    }
}

/// Conversion trait for valid values for timings
///
/// Timings are in milliseconds. `Duration` values are converted to
/// fractional milliseconds.
pub trait ToTimerValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

/// Conversion trait for valid values for histograms
pub trait ToHistogramValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

/// Conversion trait for valid values for distributions
pub trait ToDistributionValue {
    fn try_to_value(self) -> MetricResult<MetricValue>;
}

macro_rules! sample_value_impls {
    ($($trait:ident),+) => {
        $(
            impl $trait for u64 {
                fn try_to_value(self) -> MetricResult<MetricValue> {
                    Ok(MetricValue::Unsigned(self))
                }
            }

            impl $trait for f64 {
                fn try_to_value(self) -> MetricResult<MetricValue> {
                    finite(self)
                }
            }

            impl $trait for Duration {
                fn try_to_value(self) -> MetricResult<MetricValue> {
                    Ok(MetricValue::from_duration(self))
                }
            }
        )+
    };
}

sample_value_impls!(ToTimerValue, ToHistogramValue, ToDistributionValue);

/// Conversion trait for the status of a service check
///
/// Accepts the status itself, its numeric code, or its lowercase name.
pub trait ToServiceCheckStatus {
    fn try_to_status(self) -> MetricResult<ServiceCheckStatus>;
}

impl ToServiceCheckStatus for ServiceCheckStatus {
    fn try_to_status(self) -> MetricResult<ServiceCheckStatus> {
        Ok(self)
    }
}

impl ToServiceCheckStatus for u8 {
    fn try_to_status(self) -> MetricResult<ServiceCheckStatus> {
        ServiceCheckStatus::try_from(self)
    }
}

impl ToServiceCheckStatus for &str {
    fn try_to_status(self) -> MetricResult<ServiceCheckStatus> {
        self.parse()
    }
}
