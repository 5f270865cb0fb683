// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::types::{ErrorKind, MetricError, MetricResult, MetricType, ServiceCheckStatus};
use std::fmt;
use std::str::FromStr;

const SERVICE_CHECK_PREFIX: &str = "_sc|";
const EVENT_PREFIX: &str = "_e{";

/// Value carried by a datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum DatagramValue {
    Integer(i64),
    Float(f64),
    /// Non-numeric values, such as the text of an event.
    Text(String),
}

impl DatagramValue {
    fn parse(raw: &str) -> DatagramValue {
        if let Ok(v) = raw.parse::<i64>() {
            DatagramValue::Integer(v)
        } else if let Ok(v) = raw.parse::<f64>() {
            DatagramValue::Float(v)
        } else {
            DatagramValue::Text(raw.to_string())
        }
    }

    /// The value as a float, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            DatagramValue::Integer(v) => Some(v as f64),
            DatagramValue::Float(v) => Some(v),
            DatagramValue::Text(_) => None,
        }
    }
}

/// One wire-encoded metric observation.
///
/// A `Datagram` is built from its wire text, which it keeps verbatim as
/// `source()`. Every other field is derived from that text, so a datagram
/// never changes after it has been constructed.
///
/// Datagrams are what a `Client::capture` call hands back.
///
/// # Example
///
/// ```
/// use statsd_instrument::{Datagram, MetricType};
///
/// let datagram = Datagram::parse("foo.bar:1|c|@0.5|#env:prod").unwrap();
///
/// assert_eq!("foo.bar", datagram.name());
/// assert_eq!(MetricType::Counter, datagram.metric_type());
/// assert_eq!(0.5, datagram.sample_rate());
/// assert_eq!(&["env:prod".to_string()], datagram.tags());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Datagram {
    source: String,
    name: String,
    metric_type: MetricType,
    value: DatagramValue,
    sample_rate: f64,
    tags: Vec<String>,
}

impl Datagram {
    /// Parse wire text produced by either dialect.
    ///
    /// # Failures
    ///
    /// Returns an `InvalidArgument` error if the text is not a metric,
    /// service check, or event datagram.
    pub fn parse<S: Into<String>>(source: S) -> MetricResult<Datagram> {
        let source = source.into();
        let parsed = if source.starts_with(SERVICE_CHECK_PREFIX) {
            parse_service_check(&source)
        } else if source.starts_with(EVENT_PREFIX) {
            parse_event(&source)
        } else {
            parse_metric(&source)
        };

        let parts = parsed.ok_or_else(malformed_datagram_error)?;
        Ok(Datagram {
            source,
            name: parts.name,
            metric_type: parts.metric_type,
            value: parts.value,
            sample_rate: parts.sample_rate,
            tags: parts.tags,
        })
    }

    /// The exact wire text of this datagram.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Metric name including any prefix. For events this is the title.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// The value; for service checks this is the numeric status code and
    /// for events the (unescaped) text.
    pub fn value(&self) -> &DatagramValue {
        &self.value
    }

    /// Sample rate the datagram was emitted at, `1.0` when none was encoded.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl fmt::Display for Datagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.source.fmt(f)
    }
}

impl FromStr for Datagram {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Datagram::parse(s)
    }
}

struct Parts {
    name: String,
    metric_type: MetricType,
    value: DatagramValue,
    sample_rate: f64,
    tags: Vec<String>,
}

impl Parts {
    fn new(name: String, metric_type: MetricType, value: DatagramValue) -> Parts {
        Parts {
            name,
            metric_type,
            value,
            sample_rate: 1.0,
            tags: Vec::new(),
        }
    }

    // Optional trailing segments; ones we don't know about (hostnames,
    // timestamps, container IDs, ...) are skipped.
    fn read_segments<'a, I>(mut self, segments: I) -> Option<Parts>
    where
        I: Iterator<Item = &'a str>,
    {
        for segment in segments {
            if let Some(rate) = segment.strip_prefix('@') {
                self.sample_rate = rate.parse().ok()?;
            } else if let Some(tags) = segment.strip_prefix('#') {
                self.tags
                    .extend(tags.split(',').filter(|t| !t.is_empty()).map(str::to_string));
            }
        }
        Some(self)
    }
}

fn parse_metric(source: &str) -> Option<Parts> {
    let mut segments = source.split('|');
    let (name, raw_value) = segments.next()?.split_once(':')?;
    let metric_type = MetricType::from_wire(segments.next()?)?;

    if name.is_empty() || raw_value.is_empty() {
        return None;
    }

    Parts::new(name.to_string(), metric_type, DatagramValue::parse(raw_value)).read_segments(segments)
}

fn parse_service_check(source: &str) -> Option<Parts> {
    let mut segments = source[SERVICE_CHECK_PREFIX.len()..].split('|');
    let name = segments.next().filter(|n| !n.is_empty())?;
    let status: ServiceCheckStatus = segments.next()?.parse::<u8>().ok()?.try_into().ok()?;

    Parts::new(
        name.to_string(),
        MetricType::ServiceCheck,
        DatagramValue::Integer(i64::from(status.code())),
    )
    .read_segments(segments)
}

fn parse_event(source: &str) -> Option<Parts> {
    let rest = &source[EVENT_PREFIX.len()..];
    let (lengths, rest) = rest.split_once("}:")?;
    let (title_len, text_len) = lengths.split_once(',')?;
    let title_len: usize = title_len.parse().ok()?;
    let text_len: usize = text_len.parse().ok()?;

    // Lengths are in bytes of the escaped text, and both title and text
    // may themselves contain `|`.
    let title = rest.get(..title_len)?;
    let rest = rest.get(title_len..)?.strip_prefix('|')?;
    let text = rest.get(..text_len)?;
    let rest = rest.get(text_len..)?;

    let parts = Parts::new(
        unescape_newlines(title),
        MetricType::Event,
        DatagramValue::Text(unescape_newlines(text)),
    );

    if rest.is_empty() {
        Some(parts)
    } else {
        parts.read_segments(rest.strip_prefix('|')?.split('|'))
    }
}

fn unescape_newlines(s: &str) -> String {
    s.replace("\\n", "\n")
}

fn malformed_datagram_error() -> MetricError {
    MetricError::from((ErrorKind::InvalidArgument, "Malformed datagram"))
}
