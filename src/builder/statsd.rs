// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use super::{DatagramBuilder, Dialect};
use crate::types::MetricType;

/// Builder for the plain Statsd dialect.
///
/// Supports counters, gauges, sets, and timings. Tags and the DogStatsD
/// metric types are rejected.
///
/// ``` text
/// some.counter:1|c
/// some.timer:122.54|ms|@0.5
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsdDatagramBuilder;

impl DatagramBuilder for StatsdDatagramBuilder {
    fn dialect(&self) -> Dialect {
        Dialect::Statsd
    }

    fn supports(&self, metric_type: MetricType) -> bool {
        matches!(
            metric_type,
            MetricType::Counter | MetricType::Gauge | MetricType::Set | MetricType::Timing
        )
    }

    fn supports_tags(&self) -> bool {
        false
    }

    fn latency_metric_type(&self) -> MetricType {
        MetricType::Timing
    }
}

#[cfg(test)]
mod tests {
    use super::StatsdDatagramBuilder;
    use crate::builder::{DatagramBuilder, EventOptions, MetricValue, ServiceCheckOptions};
    use crate::types::{ErrorKind, MetricType, ServiceCheckStatus};

    fn render(metric_type: MetricType, value: MetricValue) -> String {
        StatsdDatagramBuilder
            .render("foo", metric_type, value, 1.0, &[])
            .unwrap()
    }

    #[test]
    fn test_statsd_counter() {
        assert_eq!("foo:1|c", render(MetricType::Counter, MetricValue::Signed(1)));
    }

    #[test]
    fn test_statsd_timing() {
        assert_eq!("foo:122.54|ms", render(MetricType::Timing, MetricValue::Float(122.54)));
        assert_eq!("foo:100.0|ms", render(MetricType::Timing, MetricValue::Float(100.0)));
    }

    #[test]
    fn test_statsd_gauge_and_set() {
        assert_eq!("foo:123|g", render(MetricType::Gauge, MetricValue::Signed(123)));
        assert_eq!("foo:12345|s", render(MetricType::Set, MetricValue::Signed(12345)));
    }

    #[test]
    fn test_statsd_timing_with_sample_rate() {
        let res = StatsdDatagramBuilder.render("foo", MetricType::Timing, MetricValue::Unsigned(3), 0.25, &[]);
        assert_eq!("foo:3|ms|@0.25", res.unwrap());
    }

    #[test]
    fn test_statsd_rejects_dogstatsd_types() {
        for metric_type in [MetricType::Histogram, MetricType::Distribution] {
            let err = StatsdDatagramBuilder
                .render("foo", metric_type, MetricValue::Float(1.0), 1.0, &[])
                .unwrap_err();
            assert_eq!(ErrorKind::UnsupportedMetricType, err.kind());
        }
    }

    #[test]
    fn test_statsd_rejects_tags() {
        let err = StatsdDatagramBuilder
            .render("foo", MetricType::Counter, MetricValue::Signed(1), 1.0, &[(None, "beta")])
            .unwrap_err();
        assert_eq!(ErrorKind::UnsupportedFeature, err.kind());
    }

    #[test]
    fn test_statsd_rejects_service_checks_and_events() {
        let err = StatsdDatagramBuilder
            .render_service_check("svc", ServiceCheckStatus::Ok, &ServiceCheckOptions::default(), &[])
            .unwrap_err();
        assert_eq!(ErrorKind::UnsupportedMetricType, err.kind());

        let err = StatsdDatagramBuilder
            .render_event("title", "text", &EventOptions::default(), &[])
            .unwrap_err();
        assert_eq!(ErrorKind::UnsupportedMetricType, err.kind());
    }
}
