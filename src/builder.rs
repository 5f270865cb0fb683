// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rendering of metric observations into wire text.
//!
//! Each supported wire dialect has a `DatagramBuilder` implementation. The
//! dialects are a closed set selected through `Dialect` when a client is
//! built, and each one states exactly which `MetricType` values it accepts.

mod dogstatsd;
mod statsd;
mod value;

pub use self::dogstatsd::DogStatsdDatagramBuilder;
pub use self::statsd::StatsdDatagramBuilder;
pub use self::value::{
    MetricValue, ToCounterValue, ToDistributionValue, ToGaugeValue, ToHistogramValue, ToServiceCheckStatus,
    ToSetValue, ToTimerValue,
};

use crate::types::{
    ErrorKind, EventAlertType, EventPriority, MetricError, MetricResult, MetricType, ServiceCheckStatus,
};
use std::fmt;

/// A tag attached to a datagram: either a `key:value` pair or a bare value.
pub type Tag<'a> = (Option<&'a str>, &'a str);

/// Wire dialect spoken by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Plain Statsd: counters, gauges, sets, and timings. No tags.
    Statsd,
    /// Datadog's extended Statsd: adds tags, histograms, distributions,
    /// service checks, and events.
    #[default]
    DogStatsd,
}

impl Dialect {
    /// The builder that renders datagrams for this dialect.
    pub fn builder(&self) -> &'static dyn DatagramBuilder {
        match *self {
            Dialect::Statsd => &StatsdDatagramBuilder,
            Dialect::DogStatsd => &DogStatsdDatagramBuilder,
        }
    }
}

/// Optional parts of a service check datagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceCheckOptions<'a> {
    pub timestamp: Option<u64>,
    pub hostname: Option<&'a str>,
    pub message: Option<&'a str>,
}

/// Optional parts of an event datagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOptions<'a> {
    pub timestamp: Option<u64>,
    pub hostname: Option<&'a str>,
    pub aggregation_key: Option<&'a str>,
    pub priority: Option<EventPriority>,
    pub source_type_name: Option<&'a str>,
    pub alert_type: Option<EventAlertType>,
}

/// Shared contract for rendering one observation as wire text.
///
/// Rendering is a pure function of its arguments. Names passed in are
/// expected to already carry any client prefix; characters that would
/// break the wire format are normalized here.
pub trait DatagramBuilder: fmt::Debug + Send + Sync {
    /// The dialect this builder renders.
    fn dialect(&self) -> Dialect;

    /// Whether `metric_type` can be expressed in this dialect.
    fn supports(&self, metric_type: MetricType) -> bool;

    /// Whether `|#tag,...` segments can be expressed in this dialect.
    fn supports_tags(&self) -> bool;

    /// Metric type that block latency measurements are reported as.
    fn latency_metric_type(&self) -> MetricType;

    /// Check that a datagram of `metric_type` carrying `tags` can be
    /// rendered, without rendering it.
    fn validate(&self, metric_type: MetricType, tags: &[Tag<'_>]) -> MetricResult<()> {
        if !self.supports(metric_type) {
            return Err(MetricError::unsupported_metric_type());
        }

        if !tags.is_empty() && !self.supports_tags() {
            return Err(MetricError::from((
                ErrorKind::UnsupportedFeature,
                "Tags are not supported by the selected dialect",
            )));
        }

        Ok(())
    }

    /// Render a counter, gauge, set, timing, histogram, or distribution.
    fn render(
        &self,
        name: &str,
        metric_type: MetricType,
        value: MetricValue,
        sample_rate: f64,
        tags: &[Tag<'_>],
    ) -> MetricResult<String> {
        if matches!(metric_type, MetricType::ServiceCheck | MetricType::Event) {
            return Err(MetricError::from((
                ErrorKind::InvalidArgument,
                "Service checks and events cannot be rendered as plain metrics",
            )));
        }

        self.validate(metric_type, tags)?;

        let mut out = String::with_capacity(name.len() + 16 + tags_size_hint(tags));
        write_name(&mut out, name);
        out.push(':');
        value.write_to(&mut out);
        out.push('|');
        out.push_str(metric_type.as_str());
        write_sample_rate(&mut out, sample_rate);
        write_tags(&mut out, tags);
        Ok(out)
    }

    /// Render a service check. Only supported by the extended dialect.
    fn render_service_check(
        &self,
        _name: &str,
        _status: ServiceCheckStatus,
        _options: &ServiceCheckOptions<'_>,
        _tags: &[Tag<'_>],
    ) -> MetricResult<String> {
        Err(MetricError::unsupported_metric_type())
    }

    /// Render an event. Only supported by the extended dialect.
    fn render_event(
        &self,
        _title: &str,
        _text: &str,
        _options: &EventOptions<'_>,
        _tags: &[Tag<'_>],
    ) -> MetricResult<String> {
        Err(MetricError::unsupported_metric_type())
    }
}

const TAG_PREFIX: &str = "|#";

// Metric names may not contain the characters used as separators in
// the wire format.
pub(crate) fn write_name(out: &mut String, name: &str) {
    out.extend(name.chars().map(|c| match c {
        ':' | '|' | '@' => '_',
        c => c,
    }));
}

fn write_tag_part(out: &mut String, part: &str) {
    out.extend(part.chars().filter(|c| *c != '|' && *c != ','));
}

pub(crate) fn write_tags(out: &mut String, tags: &[Tag<'_>]) {
    if tags.is_empty() {
        return;
    }

    out.push_str(TAG_PREFIX);
    for (i, &(key, value)) in tags.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if let Some(key) = key {
            write_tag_part(out, key);
            out.push(':');
        }
        write_tag_part(out, value);
    }
}

pub(crate) fn write_sample_rate(out: &mut String, sample_rate: f64) {
    if sample_rate < 1.0 {
        out.push_str("|@");
        out.push_str(ryu::Buffer::new().format(sample_rate));
    }
}

pub(crate) fn tags_size_hint(tags: &[Tag<'_>]) -> usize {
    if tags.is_empty() {
        return 0;
    }

    let kv_size: usize = tags
        .iter()
        .map(|(k, v)| k.map(|k| k.len() + 1).unwrap_or(0) + v.len())
        .sum();
    TAG_PREFIX.len() + kv_size + tags.len() - 1
}

// Newlines would split a datagram in two, so they're written as a
// literal backslash followed by `n`.
pub(crate) fn escape_newlines(s: &str) -> String {
    s.replace('\n', "\\n")
}
