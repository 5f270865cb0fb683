// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-call builders returned by the `..._with` client methods.

use crate::builder::{EventOptions, MetricValue, ServiceCheckOptions, Tag};
use crate::client::Client;
use crate::timing::time_block;
use crate::types::{EventAlertType, EventPriority, MetricError, MetricResult, MetricType, ServiceCheckStatus};

/// What a single call wants written, before prefixing and rendering.
#[derive(Debug, Clone)]
pub(crate) enum Payload<'m> {
    Value(MetricType, MetricValue),
    ServiceCheck(ServiceCheckStatus, ServiceCheckOptions<'m>),
    Event(&'m str, EventOptions<'m>),
}

impl<'m> Payload<'m> {
    pub(crate) fn metric_type(&self) -> MetricType {
        match *self {
            Payload::Value(metric_type, _) => metric_type,
            Payload::ServiceCheck(..) => MetricType::ServiceCheck,
            Payload::Event(..) => MetricType::Event,
        }
    }
}

/// One call's worth of options.
#[derive(Debug, Clone)]
pub(crate) struct Observation<'m> {
    pub(crate) key: &'m str,
    pub(crate) payload: Payload<'m>,
    pub(crate) sample_rate: Option<f64>,
    pub(crate) no_prefix: bool,
    pub(crate) tags: Vec<Tag<'m>>,
}

impl<'m> Observation<'m> {
    pub(crate) fn new(key: &'m str, payload: Payload<'m>) -> Self {
        Observation {
            key,
            payload,
            sample_rate: None,
            no_prefix: false,
            tags: Vec::new(),
        }
    }
}

enum BuilderRepr<'m, 'c> {
    Success(Observation<'m>, &'c Client),
    Error(MetricError, &'c Client),
}

impl<'m, 'c> BuilderRepr<'m, 'c> {
    fn observation(&mut self) -> Option<&mut Observation<'m>> {
        match *self {
            BuilderRepr::Success(ref mut obs, _) => Some(obs),
            BuilderRepr::Error(..) => None,
        }
    }

    fn try_send(self) -> MetricResult<()> {
        match self {
            BuilderRepr::Error(err, _) => Err(err),
            BuilderRepr::Success(obs, client) => client.submit(&obs),
        }
    }

    fn send(self) {
        match self {
            BuilderRepr::Error(err, client) => client.consume_error(err),
            BuilderRepr::Success(obs, client) => {
                if let Err(e) = client.submit(&obs) {
                    client.consume_error(e);
                }
            }
        }
    }
}

/// Builder for customizing a counter, gauge, set, timing, histogram, or
/// distribution before it is sent.
///
/// Instances are returned by the `..._with` methods of a `Client`. Nothing
/// is written until `.try_send()` or `.send()` is called.
///
/// # Example
///
/// ```
/// use statsd_instrument::prelude::*;
/// use statsd_instrument::Client;
///
/// let client = Client::builder().with_prefix("some.prefix").build();
/// let datagrams = client.capture(|| {
///     client
///         .increment_with("some.key")
///         .with_tag("user", "authenticated")
///         .with_tag_value("beta")
///         .send();
/// });
///
/// assert_eq!(
///     "some.prefix.some.key:1|c|#user:authenticated,beta",
///     datagrams[0].source()
/// );
/// ```
#[must_use = "Did you forget to call .send() after adding tags?"]
pub struct MetricBuilder<'m, 'c> {
    repr: BuilderRepr<'m, 'c>,
}

impl<'m, 'c> MetricBuilder<'m, 'c> {
    pub(crate) fn new(key: &'m str, metric_type: MetricType, value: MetricResult<MetricValue>, client: &'c Client) -> Self {
        let repr = match value {
            Ok(v) => BuilderRepr::Success(Observation::new(key, Payload::Value(metric_type, v)), client),
            Err(e) => BuilderRepr::Error(e, client),
        };
        MetricBuilder { repr }
    }

    /// Add a key-value tag to this metric.
    pub fn with_tag(mut self, key: &'m str, value: &'m str) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.tags.push((Some(key), value));
        }
        self
    }

    /// Add a value tag to this metric.
    pub fn with_tag_value(mut self, value: &'m str) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.tags.push((None, value));
        }
        self
    }

    /// Keep this metric with probability `rate`, in `[0, 1]`.
    ///
    /// Kept metrics carry the rate on the wire so the server can scale
    /// them. A rate of `0` means the metric is never written.
    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.sample_rate = Some(rate);
        }
        self
    }

    /// Use the key as-is, without the client's prefix.
    pub fn no_prefix(mut self) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.no_prefix = true;
        }
        self
    }

    /// Send the metric using the client that created this builder.
    ///
    /// Not being sampled is not an error: `Ok(())` is returned whether or
    /// not the metric was written.
    pub fn try_send(self) -> MetricResult<()> {
        self.repr.try_send()
    }

    /// Send the metric, passing any error to the client's error handler.
    pub fn send(self) {
        self.repr.send()
    }
}

/// Builder for a service check. Only the DogStatsD dialect can send these.
///
/// # Example
///
/// ```
/// use statsd_instrument::prelude::*;
/// use statsd_instrument::{Client, ServiceCheckStatus};
///
/// let client = Client::builder().build();
/// let datagrams = client.capture(|| {
///     client
///         .service_check_with("db.primary", ServiceCheckStatus::Critical)
///         .with_hostname("db01")
///         .with_message("replication stopped")
///         .send();
/// });
///
/// assert_eq!(
///     "_sc|db.primary|2|h:db01|m:replication stopped",
///     datagrams[0].source()
/// );
/// ```
#[must_use = "Did you forget to call .send() after adding options?"]
pub struct ServiceCheckBuilder<'m, 'c> {
    repr: BuilderRepr<'m, 'c>,
}

impl<'m, 'c> ServiceCheckBuilder<'m, 'c> {
    pub(crate) fn new(key: &'m str, status: MetricResult<ServiceCheckStatus>, client: &'c Client) -> Self {
        let repr = match status {
            Ok(s) => BuilderRepr::Success(
                Observation::new(key, Payload::ServiceCheck(s, ServiceCheckOptions::default())),
                client,
            ),
            Err(e) => BuilderRepr::Error(e, client),
        };
        ServiceCheckBuilder { repr }
    }

    fn options(&mut self) -> Option<&mut ServiceCheckOptions<'m>> {
        match self.repr.observation() {
            Some(Observation {
                payload: Payload::ServiceCheck(_, options),
                ..
            }) => Some(options),
            _ => None,
        }
    }

    pub fn with_tag(mut self, key: &'m str, value: &'m str) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.tags.push((Some(key), value));
        }
        self
    }

    pub fn with_tag_value(mut self, value: &'m str) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.tags.push((None, value));
        }
        self
    }

    pub fn with_hostname(mut self, hostname: &'m str) -> Self {
        if let Some(options) = self.options() {
            options.hostname = Some(hostname);
        }
        self
    }

    /// Unix timestamp, in seconds, of the check.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        if let Some(options) = self.options() {
            options.timestamp = Some(timestamp);
        }
        self
    }

    pub fn with_message(mut self, message: &'m str) -> Self {
        if let Some(options) = self.options() {
            options.message = Some(message);
        }
        self
    }

    pub fn no_prefix(mut self) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.no_prefix = true;
        }
        self
    }

    pub fn try_send(self) -> MetricResult<()> {
        self.repr.try_send()
    }

    pub fn send(self) {
        self.repr.send()
    }
}

/// Builder for an event. Only the DogStatsD dialect can send these.
#[must_use = "Did you forget to call .send() after adding options?"]
pub struct EventBuilder<'m, 'c> {
    repr: BuilderRepr<'m, 'c>,
}

impl<'m, 'c> EventBuilder<'m, 'c> {
    pub(crate) fn new(title: &'m str, text: &'m str, client: &'c Client) -> Self {
        let obs = Observation::new(title, Payload::Event(text, EventOptions::default()));
        EventBuilder {
            repr: BuilderRepr::Success(obs, client),
        }
    }

    fn options(&mut self) -> Option<&mut EventOptions<'m>> {
        match self.repr.observation() {
            Some(Observation {
                payload: Payload::Event(_, options),
                ..
            }) => Some(options),
            _ => None,
        }
    }

    pub fn with_tag(mut self, key: &'m str, value: &'m str) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.tags.push((Some(key), value));
        }
        self
    }

    pub fn with_tag_value(mut self, value: &'m str) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.tags.push((None, value));
        }
        self
    }

    pub fn with_hostname(mut self, hostname: &'m str) -> Self {
        if let Some(options) = self.options() {
            options.hostname = Some(hostname);
        }
        self
    }

    /// Unix timestamp, in seconds, of the event.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        if let Some(options) = self.options() {
            options.timestamp = Some(timestamp);
        }
        self
    }

    /// Events sharing a key are grouped together by the server.
    pub fn with_aggregation_key(mut self, key: &'m str) -> Self {
        if let Some(options) = self.options() {
            options.aggregation_key = Some(key);
        }
        self
    }

    pub fn with_priority(mut self, priority: EventPriority) -> Self {
        if let Some(options) = self.options() {
            options.priority = Some(priority);
        }
        self
    }

    pub fn with_source_type_name(mut self, source_type: &'m str) -> Self {
        if let Some(options) = self.options() {
            options.source_type_name = Some(source_type);
        }
        self
    }

    pub fn with_alert_type(mut self, alert_type: EventAlertType) -> Self {
        if let Some(options) = self.options() {
            options.alert_type = Some(alert_type);
        }
        self
    }

    pub fn no_prefix(mut self) -> Self {
        if let Some(obs) = self.repr.observation() {
            obs.no_prefix = true;
        }
        self
    }

    pub fn try_send(self) -> MetricResult<()> {
        self.repr.try_send()
    }

    pub fn send(self) {
        self.repr.send()
    }
}

/// Builder for timing a block of code.
///
/// Returned by `Client::measure_block`, `Client::distribution_block`, and
/// `Client::latency`. The block is run exactly once by `.time()` or
/// `.try_time()`; the elapsed time, in milliseconds, is written after the
/// block returns, and also if it panics.
///
/// # Example
///
/// ```
/// use statsd_instrument::Client;
///
/// let client = Client::builder().build();
/// let mut rows = 0;
///
/// let datagrams = client.capture(|| {
///     rows = client.latency("db.query").with_tag("table", "users").time(|| 42);
/// });
///
/// assert_eq!(42, rows);
/// assert_eq!("db.query", datagrams[0].name());
/// ```
#[must_use = "Did you forget to call .time() with a block?"]
pub struct TimedBuilder<'m, 'c> {
    client: &'c Client,
    key: &'m str,
    metric_type: Option<MetricType>,
    sample_rate: Option<f64>,
    no_prefix: bool,
    tags: Vec<Tag<'m>>,
}

impl<'m, 'c> TimedBuilder<'m, 'c> {
    /// `None` reports as the dialect's preferred latency type.
    pub(crate) fn new(key: &'m str, metric_type: Option<MetricType>, client: &'c Client) -> Self {
        TimedBuilder {
            client,
            key,
            metric_type,
            sample_rate: None,
            no_prefix: false,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: &'m str, value: &'m str) -> Self {
        self.tags.push((Some(key), value));
        self
    }

    pub fn with_tag_value(mut self, value: &'m str) -> Self {
        self.tags.push((None, value));
        self
    }

    /// Keep the measurement with probability `rate`. The block runs
    /// regardless of the outcome, including when `rate` is `0`.
    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    pub fn no_prefix(mut self) -> Self {
        self.no_prefix = true;
        self
    }

    /// Report as `metric_type` instead of the default for this builder,
    /// e.g. a histogram rather than a distribution.
    pub fn as_metric_type(mut self, metric_type: MetricType) -> Self {
        self.metric_type = Some(metric_type);
        self
    }

    /// Run `block`, write how long it took, and return what it returned.
    ///
    /// Errors writing the measurement go to the client's error handler.
    pub fn time<F, R>(self, block: F) -> R
    where
        F: FnOnce() -> R,
    {
        let client = self.client;
        let clock = client.clock();
        time_block(clock, block, move |elapsed| {
            if let Err(e) = client.submit(&self.observation(elapsed)) {
                client.consume_error(e);
            }
        })
    }

    /// Run `block`, write how long it took, and return what it returned
    /// or the error writing the measurement.
    ///
    /// A measurement the client could never write (a metric type or tags
    /// its dialect doesn't support, an invalid sample rate) is reported
    /// before `block` runs, in which case the block is not run at all.
    pub fn try_time<F, R>(self, block: F) -> MetricResult<R>
    where
        F: FnOnce() -> R,
    {
        let client = self.client;
        let probe = self.observation(Default::default());
        client.check(&probe)?;

        let mut outcome = Ok(());
        let value = time_block(client.clock(), block, |elapsed| {
            outcome = client.submit(&self.observation(elapsed));
        });
        outcome.map(|_| value)
    }

    fn observation(&self, elapsed: std::time::Duration) -> Observation<'m> {
        let metric_type = self
            .metric_type
            .unwrap_or_else(|| self.client.dialect().builder().latency_metric_type());

        Observation {
            key: self.key,
            payload: Payload::Value(metric_type, MetricValue::from_duration(elapsed)),
            sample_rate: self.sample_rate,
            no_prefix: self.no_prefix,
            tags: self.tags.clone(),
        }
    }
}
