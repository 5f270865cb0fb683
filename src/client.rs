// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::{
    Dialect, Tag, ToCounterValue, ToDistributionValue, ToGaugeValue, ToHistogramValue, ToServiceCheckStatus,
    ToSetValue, ToTimerValue,
};
use crate::capture;
use crate::datagram::Datagram;
use crate::metric::{EventBuilder, MetricBuilder, Observation, Payload, ServiceCheckBuilder, TimedBuilder};
use crate::sinks::{CaptureSink, MetricSink, NopMetricSink, SharedMetricSink};
use crate::types::{ErrorKind, MetricError, MetricResult, MetricType, ServiceCheckStatus};
use quanta::Clock;
use std::borrow::Cow;
use std::fmt;
use std::panic::RefUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

type ErrorHandler = Arc<dyn Fn(MetricError) + Sync + Send + RefUnwindSafe>;

/// Trait for incrementing and decrementing counters.
///
/// Counters are simple values incremented or decremented by a client. The
/// rates at which these events occur or average values will be determined
/// by the server receiving them. Examples of counter uses include number
/// of logins to a system or requests received.
///
/// The following types are valid for counters:
/// * `i64`
pub trait Counted<T>
where
    T: ToCounterValue,
{
    /// Increment or decrement the counter by the given amount
    fn count(&self, key: &str, count: T) -> MetricResult<()> {
        self.count_with(key, count).try_send()
    }

    /// Increment or decrement the counter by the given amount and return
    /// a `MetricBuilder` that can be used to add tags or a sample rate.
    fn count_with<'a>(&'a self, key: &'a str, count: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for convenience methods for counters
///
/// This trait specifically implements increment and decrement convenience
/// methods for counters with `i64` types.
pub trait CountedExt: Counted<i64> {
    /// Increment the counter by 1
    fn increment(&self, key: &str) -> MetricResult<()> {
        self.increment_with(key).try_send()
    }

    fn increment_with<'a>(&'a self, key: &'a str) -> MetricBuilder<'a, 'a> {
        self.count_with(key, 1)
    }

    /// Decrement the counter by 1
    fn decrement(&self, key: &str) -> MetricResult<()> {
        self.decrement_with(key).try_send()
    }

    fn decrement_with<'a>(&'a self, key: &'a str) -> MetricBuilder<'a, 'a> {
        self.count_with(key, -1)
    }
}

/// Trait for recording timings in milliseconds.
///
/// Timings are a positive number of milliseconds between a start and end
/// time. `Duration` values are converted to fractional milliseconds.
///
/// The following types are valid for timings:
/// * `u64`
/// * `f64`
/// * `Duration`
///
/// To time a block of code use `Client::measure_block` instead.
pub trait Measured<T>
where
    T: ToTimerValue,
{
    /// Record a timing in milliseconds with the given key
    fn measure(&self, key: &str, time: T) -> MetricResult<()> {
        self.measure_with(key, time).try_send()
    }

    fn measure_with<'a>(&'a self, key: &'a str, time: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for recording gauge values.
///
/// Gauge values are an instantaneous measurement of a value determined
/// by the client. They do not change unless changed by the client.
///
/// The following types are valid for gauges:
/// * `i64`
/// * `f64`
pub trait Gauged<T>
where
    T: ToGaugeValue,
{
    /// Record a gauge value with the given key
    fn gauge(&self, key: &str, value: T) -> MetricResult<()> {
        self.gauge_with(key, value).try_send()
    }

    fn gauge_with<'a>(&'a self, key: &'a str, value: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for recording set values.
///
/// Sets count the number of unique elements in a group. You can use them
/// to, for example, count the unique visitors to your site.
///
/// The following types are valid for sets:
/// * `i64`
pub trait Setted<T>
where
    T: ToSetValue,
{
    /// Record a single set value with the given key
    fn set(&self, key: &str, value: T) -> MetricResult<()> {
        self.set_with(key, value).try_send()
    }

    fn set_with<'a>(&'a self, key: &'a str, value: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for recording histogram values.
///
/// Histogram values are positive values that can represent anything, whose
/// statistical distribution is calculated by the server.
///
/// The following types are valid for histograms:
/// * `u64`
/// * `f64`
/// * `Duration`
///
/// Note that histograms are a DogStatsD extension; clients using the
/// plain Statsd dialect fail these with `UnsupportedMetricType`.
pub trait Histogrammed<T>
where
    T: ToHistogramValue,
{
    /// Record a single histogram value with the given key
    fn histogram(&self, key: &str, value: T) -> MetricResult<()> {
        self.histogram_with(key, value).try_send()
    }

    fn histogram_with<'a>(&'a self, key: &'a str, value: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for recording distribution values.
///
/// Similar to histograms, but the statistical distribution is calculated
/// globally by the server rather than per host.
///
/// The following types are valid for distributions:
/// * `u64`
/// * `f64`
/// * `Duration`
///
/// Note that distributions are a DogStatsD extension.
pub trait Distributed<T>
where
    T: ToDistributionValue,
{
    /// Record a single distribution value with the given key
    fn distribution(&self, key: &str, value: T) -> MetricResult<()> {
        self.distribution_with(key, value).try_send()
    }

    fn distribution_with<'a>(&'a self, key: &'a str, value: T) -> MetricBuilder<'a, 'a>;
}

/// Trait for reporting the health of a service.
///
/// The status can be given as a `ServiceCheckStatus`, its numeric code
/// (`0` to `3`), or its name (`"ok"`, `"warning"`, `"critical"`,
/// `"unknown"`). Service checks are a DogStatsD extension.
pub trait ServiceChecked<T>
where
    T: ToServiceCheckStatus,
{
    fn service_check(&self, name: &str, status: T) -> MetricResult<()> {
        self.service_check_with(name, status).try_send()
    }

    fn service_check_with<'a>(&'a self, name: &'a str, status: T) -> ServiceCheckBuilder<'a, 'a>;
}

/// Trait for sending events. Events are a DogStatsD extension.
///
/// Newlines in the title and text are escaped on the wire.
pub trait Evented {
    fn event(&self, title: &str, text: &str) -> MetricResult<()> {
        self.event_with(title, text).try_send()
    }

    fn event_with<'a>(&'a self, title: &'a str, text: &'a str) -> EventBuilder<'a, 'a>;
}

/// Trait that encompasses all other traits for sending metrics.
///
/// If you wish to use `Client` with a generic type or place a `Client`
/// instance behind a pointer (such as a `Box`) this will allow you to
/// reference all the implemented methods for recording metrics.
///
/// ```
/// use statsd_instrument::prelude::*;
/// use statsd_instrument::Client;
/// use std::time::Duration;
///
/// let client: Box<dyn MetricClient> = Box::new(Client::builder().build());
///
/// client.count("some.counter", 1).unwrap();
/// client.measure("some.timer", 42).unwrap();
/// client.measure("some.timer", Duration::from_millis(42)).unwrap();
/// client.gauge("some.gauge", 8).unwrap();
/// client.gauge("some.gauge", 12.3).unwrap();
/// client.histogram("some.histogram", 4).unwrap();
/// client.distribution("some.distribution", 4.5).unwrap();
/// client.set("some.set", 5).unwrap();
/// client.service_check("some.service", "ok").unwrap();
/// client.event("deploy", "done").unwrap();
/// ```
pub trait MetricClient:
    Counted<i64>
    + CountedExt
    + Measured<u64>
    + Measured<f64>
    + Measured<Duration>
    + Gauged<i64>
    + Gauged<f64>
    + Setted<i64>
    + Histogrammed<u64>
    + Histogrammed<f64>
    + Histogrammed<Duration>
    + Distributed<u64>
    + Distributed<f64>
    + Distributed<Duration>
    + ServiceChecked<ServiceCheckStatus>
    + ServiceChecked<u8>
    + for<'s> ServiceChecked<&'s str>
    + Evented
{
}

/// Builder for creating and customizing `Client` instances.
///
/// Instances of the builder should be created by calling the `::builder()`
/// method on the `Client` struct, or `Client::to_builder` to start from an
/// existing client.
///
/// # Example
///
/// ```
/// use statsd_instrument::prelude::*;
/// use statsd_instrument::{Client, Dialect, MetricError, NopMetricSink};
///
/// fn my_error_handler(err: MetricError) {
///     println!("Metric error! {}", err);
/// }
///
/// let client = Client::builder()
///     .with_prefix("prefix")
///     .with_dialect(Dialect::DogStatsd)
///     .with_sink(NopMetricSink)
///     .with_error_handler(my_error_handler)
///     .with_tag("environment", "production")
///     .with_tag_value("rust")
///     .build();
///
/// client.count("something", 123).unwrap();
/// client.count_with("some.counter", 42)
///     .with_tag("region", "us-east-2")
///     .send();
/// ```
pub struct ClientBuilder {
    prefix: String,
    dialect: Dialect,
    sink: SharedMetricSink,
    errors: ErrorHandler,
    tags: Vec<(Option<String>, String)>,
    default_sample_rate: f64,
    clock: Clock,
}

impl ClientBuilder {
    fn new() -> Self {
        ClientBuilder {
            prefix: String::new(),
            dialect: Dialect::default(),
            sink: Arc::new(NopMetricSink),
            errors: Arc::new(log_error_handler),
            tags: Vec::new(),
            default_sample_rate: 1.0,
            clock: Clock::new(),
        }
    }

    /// Prefix prepended, followed by a `.`, to every metric name. An
    /// empty prefix removes any prefix set before.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Self::formatted_prefix(prefix);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the sink that sampling decisions are asked of and datagrams are
    /// written to.
    pub fn with_sink<T>(self, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        self.with_shared_sink(Arc::new(sink))
    }

    /// Set a sink that may also be in use by other clients.
    pub fn with_shared_sink(mut self, sink: SharedMetricSink) -> Self {
        self.sink = sink;
        self
    }

    /// Sample rate used by calls that don't set one. Must be in `[0, 1]`.
    pub fn with_default_sample_rate(mut self, rate: f64) -> Self {
        self.default_sample_rate = rate;
        self
    }

    /// Set an error handler to use for metrics sent via `.send()`
    ///
    /// The error handler is only invoked when metrics are not able to be sent
    /// correctly. Either due to invalid input, the dialect not supporting a
    /// metric, or I/O errors encountered when trying to send them via a
    /// `MetricSink`.
    ///
    /// The error handler should consume the error without panicking. By
    /// default errors are logged at `warn` level.
    pub fn with_error_handler<F>(mut self, errors: F) -> Self
    where
        F: Fn(MetricError) + Sync + Send + RefUnwindSafe + 'static,
    {
        self.errors = Arc::new(errors);
        self
    }

    /// Add a default tag with key and value to every metric published by the
    /// built [Client].
    pub fn with_tag<K, V>(mut self, key: K, value: V) -> Self
    where
        K: ToString,
        V: ToString,
    {
        self.tags.push((Some(key.to_string()), value.to_string()));
        self
    }

    /// Add a default tag with only a value to every metric published by the built
    /// [Client].
    pub fn with_tag_value<K>(mut self, value: K) -> Self
    where
        K: ToString,
    {
        self.tags.push((None, value.to_string()));
        self
    }

    /// Clock used to time blocks. Tests can pass `quanta::Clock::mock()`.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Construct a new `Client` instance based on current settings.
    pub fn build(self) -> Client {
        Client::from_builder(self)
    }

    fn formatted_prefix(prefix: &str) -> String {
        let trimmed = prefix.trim_end_matches('.');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}.", trimmed)
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ClientBuilder {{ prefix: {:?}, dialect: {:?}, sink: ..., errors: ..., tags: {:?}, default_sample_rate: {:?} }}",
            self.prefix, self.dialect, self.tags, self.default_sample_rate,
        )
    }
}

/// Client for Statsd that implements various traits to record metrics.
///
/// # Traits
///
/// The client is the main entry point for users of this library. It supports
/// several traits for recording metrics of different types.
///
/// * `Counted` and `CountedExt` for emitting counters.
/// * `Measured` for emitting timings.
/// * `Gauged` for emitting gauge values.
/// * `Setted` for emitting set values.
/// * `Histogrammed` for emitting histogram values.
/// * `Distributed` for emitting distribution values.
/// * `ServiceChecked` for reporting service checks.
/// * `Evented` for sending events.
/// * `MetricClient` for a combination of all of the above.
///
/// Blocks of code are timed with `measure_block`, `distribution_block`, and
/// `latency`.
///
/// # Sampling
///
/// Before anything is rendered the client asks the active sink whether to
/// keep the observation at the call's sample rate (the client's default
/// rate, `1.0` unless configured otherwise). A rate of `0` never writes.
///
/// # Capturing
///
/// `capture` runs a closure and returns every datagram this client wrote
/// while it ran on the current thread. Captures nest: an enclosing capture
/// also sees what inner captures recorded, and everything is still written
/// to the client's sink.
///
/// # Threading
///
/// The `Client` is `Send` and `Sync` and can be shared between threads by
/// wrapping it in an `Arc`. Captures only see datagrams written on the
/// thread that started them.
///
/// # Example
///
/// ```
/// use statsd_instrument::prelude::*;
/// use statsd_instrument::Client;
///
/// let client = Client::builder().with_prefix("my.app").build();
///
/// let datagrams = client.capture(|| {
///     client.increment("logins").unwrap();
///     client.gauge("queue.depth", 12).unwrap();
/// });
///
/// assert_eq!("my.app.logins:1|c", datagrams[0].source());
/// assert_eq!("my.app.queue.depth:12|g", datagrams[1].source());
/// ```
pub struct Client {
    id: u64,
    prefix: String,
    dialect: Dialect,
    sink: SharedMetricSink,
    errors: ErrorHandler,
    tags: Vec<(Option<String>, String)>,
    default_sample_rate: f64,
    clock: Clock,
}

impl Client {
    /// Create a new client that uses the given prefix for all metrics and
    /// writes to the given `MetricSink`, with every other setting at its
    /// default.
    ///
    /// ```
    /// use statsd_instrument::{Client, NopMetricSink};
    ///
    /// let client = Client::from_sink("my.stats", NopMetricSink);
    /// ```
    pub fn from_sink<T>(prefix: &str, sink: T) -> Self
    where
        T: MetricSink + Sync + Send + RefUnwindSafe + 'static,
    {
        Self::builder().with_prefix(prefix).with_sink(sink).build()
    }

    /// Create a new builder with default settings.
    ///
    /// Defaults:
    ///
    /// * No prefix and no default tags.
    /// * The DogStatsD dialect.
    /// * A `NopMetricSink`.
    /// * A default sample rate of `1.0`.
    /// * An error handler that logs at `warn` level.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a builder pre-filled with this client's settings, including
    /// its (shared) sink and error handler.
    pub fn to_builder(&self) -> ClientBuilder {
        ClientBuilder {
            prefix: self.prefix.clone(),
            dialect: self.dialect,
            sink: self.sink.clone(),
            errors: self.errors.clone(),
            tags: self.tags.clone(),
            default_sample_rate: self.default_sample_rate,
            clock: self.clock.clone(),
        }
    }

    /// Create a new client with this client's settings, changed by
    /// `overrides`. The new client writes to the same sink.
    ///
    /// ```
    /// use statsd_instrument::prelude::*;
    /// use statsd_instrument::Client;
    ///
    /// let client = Client::builder().build();
    /// let scoped = client.clone_with_options(|b| b.with_prefix("foo"));
    ///
    /// let datagrams = scoped.capture(|| scoped.increment("metric").unwrap());
    /// assert_eq!("foo.metric:1|c", datagrams[0].source());
    /// ```
    ///
    /// The new client has its own captures: datagrams it writes are not
    /// seen by captures started on the original, and vice versa.
    pub fn clone_with_options<F>(&self, overrides: F) -> Client
    where
        F: FnOnce(ClientBuilder) -> ClientBuilder,
    {
        overrides(self.to_builder()).build()
    }

    /// Prefix of metric names, without the trailing `.`.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.strip_suffix('.')
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn default_sample_rate(&self) -> f64 {
        self.default_sample_rate
    }

    /// Flush the underlying metric sink.
    pub fn flush(&self) -> MetricResult<()> {
        Ok(self.sink.flush()?)
    }

    /// Time a block and record it as a timing.
    pub fn measure_block<'a>(&'a self, key: &'a str) -> TimedBuilder<'a, 'a> {
        TimedBuilder::new(key, Some(MetricType::Timing), self)
    }

    /// Time a block and record it as a distribution.
    pub fn distribution_block<'a>(&'a self, key: &'a str) -> TimedBuilder<'a, 'a> {
        TimedBuilder::new(key, Some(MetricType::Distribution), self)
    }

    /// Time a block and record it as the dialect's preferred latency metric:
    /// a distribution for DogStatsD and a timing for plain Statsd.
    ///
    /// ```
    /// use statsd_instrument::{Client, Dialect};
    ///
    /// let client = Client::builder().with_dialect(Dialect::Statsd).build();
    /// let datagrams = client.capture(|| {
    ///     client.latency("db.query").time(|| ());
    /// });
    ///
    /// assert!(datagrams[0].source().ends_with("|ms"));
    /// ```
    pub fn latency<'a>(&'a self, key: &'a str) -> TimedBuilder<'a, 'a> {
        TimedBuilder::new(key, None, self)
    }

    /// Run `block` and return the datagrams this client wrote, on this
    /// thread, while it ran.
    ///
    /// Datagrams are returned in the order they were written and are still
    /// delivered to any enclosing capture and to the client's sink. The
    /// capture ends when `block` returns or panics.
    pub fn capture<F>(&self, block: F) -> Vec<Datagram>
    where
        F: FnOnce(),
    {
        let sink = Arc::new(CaptureSink::with_parent(self.active_sink()));
        {
            let _guard = capture::push(self.id, sink.clone());
            block();
        }
        sink.take_datagrams()
    }

    /// Whether a capture started by this client is active on this thread.
    pub fn is_capturing(&self) -> bool {
        capture::depth(self.id) > 0
    }

    // Create a new Client by consuming the builder
    fn from_builder(builder: ClientBuilder) -> Self {
        Client {
            id: NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed),
            prefix: builder.prefix,
            dialect: builder.dialect,
            sink: builder.sink,
            errors: builder.errors,
            tags: builder.tags,
            default_sample_rate: builder.default_sample_rate,
            clock: builder.clock,
        }
    }

    pub(crate) fn clock(&self) -> &Clock {
        &self.clock
    }

    pub(crate) fn consume_error(&self, err: MetricError) {
        (self.errors)(err);
    }

    /// Validate an observation without writing it, returning the sample
    /// rate it would be written at.
    pub(crate) fn check(&self, obs: &Observation<'_>) -> MetricResult<f64> {
        let tags = self.merged_tags(&obs.tags);
        self.resolve(obs, &tags)
    }

    /// Sample, render, and write an observation to the active sink.
    pub(crate) fn submit(&self, obs: &Observation<'_>) -> MetricResult<()> {
        let tags = self.merged_tags(&obs.tags);
        let rate = self.resolve(obs, &tags)?;
        if rate <= 0.0 {
            return Ok(());
        }

        let sink = self.active_sink();
        let sampled = matches!(obs.payload, Payload::Value(..));
        if sampled && !sink.sample(rate) {
            return Ok(());
        }

        let name = self.metric_name(obs.key, obs.no_prefix);
        let builder = self.dialect.builder();
        let datagram = match obs.payload {
            Payload::Value(metric_type, value) => builder.render(&name, metric_type, value, rate, &tags)?,
            Payload::ServiceCheck(status, ref options) => builder.render_service_check(&name, status, options, &tags)?,
            Payload::Event(text, ref options) => builder.render_event(&name, text, options, &tags)?,
        };

        sink.emit(&datagram)?;
        Ok(())
    }

    // Service checks and events are never sampled and carry no rate.
    fn resolve(&self, obs: &Observation<'_>, tags: &[Tag<'_>]) -> MetricResult<f64> {
        self.dialect.builder().validate(obs.payload.metric_type(), tags)?;

        if !matches!(obs.payload, Payload::Value(..)) {
            return Ok(1.0);
        }

        let rate = obs.sample_rate.unwrap_or(self.default_sample_rate);
        if (0.0..=1.0).contains(&rate) {
            Ok(rate)
        } else {
            Err(MetricError::from((
                ErrorKind::InvalidArgument,
                "Sample rate must be between 0 and 1",
            )))
        }
    }

    fn active_sink(&self) -> SharedMetricSink {
        match capture::current(self.id) {
            Some(capture) => capture as SharedMetricSink,
            None => self.sink.clone(),
        }
    }

    fn metric_name<'a>(&self, key: &'a str, no_prefix: bool) -> Cow<'a, str> {
        if no_prefix || self.prefix.is_empty() {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(format!("{}{}", self.prefix, key))
        }
    }

    fn merged_tags<'a>(&'a self, tags: &[Tag<'a>]) -> Vec<Tag<'a>> {
        self.tags
            .iter()
            .map(|(k, v)| (k.as_deref(), v.as_str()))
            .chain(tags.iter().copied())
            .collect()
    }
}

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn log_error_handler(err: MetricError) {
    log::warn!("statsd metric dropped: {}", err);
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Client {{ prefix: {:?}, dialect: {:?}, sink: ..., errors: ..., tags: {:?}, default_sample_rate: {:?} }}",
            self.prefix, self.dialect, self.tags, self.default_sample_rate,
        )
    }
}

impl<T> Counted<T> for Client
where
    T: ToCounterValue,
{
    fn count_with<'a>(&'a self, key: &'a str, count: T) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(key, MetricType::Counter, count.try_to_value(), self)
    }
}

impl CountedExt for Client {}

impl<T> Measured<T> for Client
where
    T: ToTimerValue,
{
    fn measure_with<'a>(&'a self, key: &'a str, time: T) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(key, MetricType::Timing, time.try_to_value(), self)
    }
}

impl<T> Gauged<T> for Client
where
    T: ToGaugeValue,
{
    fn gauge_with<'a>(&'a self, key: &'a str, value: T) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(key, MetricType::Gauge, value.try_to_value(), self)
    }
}

impl<T> Setted<T> for Client
where
    T: ToSetValue,
{
    fn set_with<'a>(&'a self, key: &'a str, value: T) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(key, MetricType::Set, value.try_to_value(), self)
    }
}

impl<T> Histogrammed<T> for Client
where
    T: ToHistogramValue,
{
    fn histogram_with<'a>(&'a self, key: &'a str, value: T) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(key, MetricType::Histogram, value.try_to_value(), self)
    }
}

impl<T> Distributed<T> for Client
where
    T: ToDistributionValue,
{
    fn distribution_with<'a>(&'a self, key: &'a str, value: T) -> MetricBuilder<'a, 'a> {
        MetricBuilder::new(key, MetricType::Distribution, value.try_to_value(), self)
    }
}

impl<T> ServiceChecked<T> for Client
where
    T: ToServiceCheckStatus,
{
    fn service_check_with<'a>(&'a self, name: &'a str, status: T) -> ServiceCheckBuilder<'a, 'a> {
        ServiceCheckBuilder::new(name, status.try_to_status(), self)
    }
}

impl Evented for Client {
    fn event_with<'a>(&'a self, title: &'a str, text: &'a str) -> EventBuilder<'a, 'a> {
        EventBuilder::new(title, text, self)
    }
}

impl MetricClient for Client {}

#[cfg(test)]
mod tests {
    use super::{Client, ClientBuilder};
    use crate::builder::Dialect;
    use crate::prelude::*;
    use crate::sinks::{MetricSink, NopMetricSink, SpyMetricSink};
    use crate::test::{ErrorMetricSink, ScriptedSink};
    use crate::types::{ErrorKind, MetricType};
    use quanta::Clock;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn statsd_client() -> Client {
        Client::builder().with_dialect(Dialect::Statsd).build()
    }

    fn dogstatsd_client() -> Client {
        Client::builder().with_dialect(Dialect::DogStatsd).build()
    }

    fn sources(client: &Client, block: impl FnOnce()) -> Vec<String> {
        client
            .capture(block)
            .into_iter()
            .map(|d| d.source().to_string())
            .collect()
    }

    #[test]
    fn test_formatted_prefix() {
        assert_eq!("", ClientBuilder::formatted_prefix(""));
        assert_eq!("", ClientBuilder::formatted_prefix("."));
        assert_eq!("foo.", ClientBuilder::formatted_prefix("foo"));
        assert_eq!("foo.", ClientBuilder::formatted_prefix("foo.."));
        assert_eq!("foo.bar.", ClientBuilder::formatted_prefix("foo.bar"));
    }

    #[test]
    fn test_prefix_accessor() {
        assert_eq!(None, Client::builder().build().prefix());
        assert_eq!(Some("foo"), Client::from_sink("foo.", NopMetricSink).prefix());
    }

    #[test]
    fn test_increment_with_default_value() {
        let client = statsd_client();
        assert_eq!(vec!["foo:1|c"], sources(&client, || client.increment("foo").unwrap()));
    }

    #[test]
    fn test_decrement_and_count() {
        let client = statsd_client();
        let got = sources(&client, || {
            client.decrement("foo").unwrap();
            client.count("foo", 5).unwrap();
        });
        assert_eq!(vec!["foo:-1|c", "foo:5|c"], got);
    }

    #[test]
    fn test_measure_with_value() {
        let client = statsd_client();
        assert_eq!(
            vec!["foo:122.54|ms"],
            sources(&client, || client.measure("foo", 122.54).unwrap())
        );
    }

    #[test]
    fn test_measure_with_block() {
        let (clock, mock) = Clock::mock();
        let client = Client::builder().with_dialect(Dialect::Statsd).with_clock(clock).build();

        let got = sources(&client, || {
            client
                .measure_block("foo")
                .time(|| mock.increment(Duration::from_millis(100)));
        });
        assert_eq!(vec!["foo:100.0|ms"], got);
    }

    #[test]
    fn test_gauge_and_set() {
        let client = statsd_client();
        let got = sources(&client, || {
            client.gauge("foo", 123).unwrap();
            client.gauge("foo", 12.3).unwrap();
            client.set("foo", 12345).unwrap();
        });
        assert_eq!(vec!["foo:123|g", "foo:12.3|g", "foo:12345|s"], got);
    }

    #[test]
    fn test_histogram() {
        let client = dogstatsd_client();
        assert_eq!(
            vec!["foo:12.44|h"],
            sources(&client, || client.histogram("foo", 12.44).unwrap())
        );
    }

    #[test]
    fn test_distribution_with_value() {
        let client = dogstatsd_client();
        assert_eq!(
            vec!["foo:12.44|d"],
            sources(&client, || client.distribution("foo", 12.44).unwrap())
        );
    }

    #[test]
    fn test_distribution_with_block() {
        let (clock, mock) = Clock::mock();
        let client = Client::builder().with_clock(clock).build();

        let got = sources(&client, || {
            client
                .distribution_block("foo")
                .time(|| mock.increment(Duration::from_millis(100)));
        });
        assert_eq!(vec!["foo:100.0|d"], got);
    }

    #[test]
    fn test_latency_emits_ms_metric() {
        let (clock, mock) = Clock::mock();
        let client = Client::builder().with_dialect(Dialect::Statsd).with_clock(clock).build();

        let got = sources(&client, || {
            client.latency("foo").time(|| mock.increment(Duration::from_millis(100)));
        });
        assert_eq!(vec!["foo:100.0|ms"], got);
    }

    #[test]
    fn test_latency_on_dogstatsd_prefers_distribution() {
        let (clock, mock) = Clock::mock();
        let client = Client::builder().with_clock(clock).build();

        let got = sources(&client, || {
            client.latency("foo").time(|| mock.increment(Duration::from_millis(100)));
        });
        assert_eq!(vec!["foo:100.0|d"], got);
    }

    #[test]
    fn test_latency_calls_block_when_not_sampled() {
        let client = statsd_client();
        let mut called = false;

        let got = client.capture(|| {
            client.latency("foo").with_sample_rate(0.0).time(|| called = true);
        });

        assert!(called);
        assert!(got.is_empty());
    }

    #[test]
    fn test_latency_emits_when_block_panics() {
        let (clock, mock) = Clock::mock();
        let client = Client::builder().with_clock(clock).build();
        let mut outcome = None;

        let datagrams = client.capture(|| {
            outcome = Some(panic::catch_unwind(AssertUnwindSafe(|| {
                client.latency("foo").time(|| {
                    mock.increment(Duration::from_millis(7));
                    panic!("query failed");
                })
            })));
        });

        let err = outcome.unwrap().unwrap_err();
        assert_eq!(Some(&"query failed"), err.downcast_ref::<&str>());
        assert_eq!("foo:7.0|d", datagrams[0].source());
    }

    #[test]
    fn test_service_check() {
        let client = dogstatsd_client();
        assert_eq!(
            vec!["_sc|service|0"],
            sources(&client, || client.service_check("service", "ok").unwrap())
        );
    }

    #[test]
    fn test_event() {
        let client = dogstatsd_client();
        assert_eq!(
            vec!["_e{7,18}:service|event\\ndescription"],
            sources(&client, || client.event("service", "event\ndescription").unwrap())
        );
    }

    #[test]
    fn test_statsd_rejects_extended_features() {
        let client = statsd_client();
        let got = client.capture(|| {
            assert_eq!(
                ErrorKind::UnsupportedMetricType,
                client.histogram("foo", 1u64).unwrap_err().kind()
            );
            assert_eq!(
                ErrorKind::UnsupportedMetricType,
                client.event("title", "text").unwrap_err().kind()
            );
            assert_eq!(
                ErrorKind::UnsupportedFeature,
                client.increment_with("foo").with_tag_value("beta").try_send().unwrap_err().kind()
            );
        });
        assert!(got.is_empty());
    }

    #[test]
    fn test_no_prefix() {
        let client = Client::builder().with_prefix("foo").build();
        let datagrams = client.capture(|| {
            client.increment("bar").unwrap();
            client.increment_with("bar").no_prefix().send();
        });

        assert_eq!(2, datagrams.len());
        assert_eq!("foo.bar", datagrams[0].name());
        assert_eq!("bar", datagrams[1].name());
    }

    #[test]
    fn test_prefix_applies_to_service_checks_and_events() {
        let client = Client::builder().with_prefix("app").build();
        let got = sources(&client, || {
            client.service_check("db", 2u8).unwrap();
            client.event("deploy", "done").unwrap();
        });
        assert_eq!(vec!["_sc|app.db|2", "_e{10,4}:app.deploy|done"], got);
    }

    #[test]
    fn test_default_tags_come_first() {
        let client = Client::builder().with_tag("env", "prod").with_tag_value("canary").build();
        let got = sources(&client, || {
            client.increment_with("foo").with_tag("host", "web01").send();
        });
        assert_eq!(vec!["foo:1|c|#env:prod,canary,host:web01"], got);
    }

    #[test]
    fn test_sampling_asks_sink_every_call() {
        let sink = Arc::new(ScriptedSink::new(vec![false, true, false, false, true]));
        let client = Client::builder().with_sink(sink.clone()).build();

        for _ in 0..5 {
            client.increment("metric").unwrap();
        }

        assert_eq!(vec![1.0; 5], sink.sampled_rates());
        assert_eq!(2, sink.emitted().len());
    }

    #[test]
    fn test_sample_rate_written_when_kept() {
        let sink = Arc::new(ScriptedSink::keep_all());
        let client = Client::builder()
            .with_dialect(Dialect::Statsd)
            .with_default_sample_rate(0.5)
            .with_sink(sink.clone())
            .build();

        client.increment("metric").unwrap();
        client.increment_with("metric").with_sample_rate(1.0).send();

        assert_eq!(vec!["metric:1|c|@0.5", "metric:1|c"], sink.emitted());
    }

    #[test]
    fn test_sample_rate_zero_never_asks_sink() {
        let sink = Arc::new(ScriptedSink::keep_all());
        let client = Client::builder().with_sink(sink.clone()).build();

        client.increment_with("metric").with_sample_rate(0.0).try_send().unwrap();

        assert!(sink.sampled_rates().is_empty());
        assert!(sink.emitted().is_empty());
    }

    #[test]
    fn test_sample_rate_out_of_range() {
        let client = Client::builder().build();
        for rate in [1.5, -0.1, f64::NAN] {
            let err = client.increment_with("metric").with_sample_rate(rate).try_send().unwrap_err();
            assert_eq!(ErrorKind::InvalidArgument, err.kind());
        }
    }

    #[test]
    fn test_service_checks_and_events_not_sampled() {
        let sink = Arc::new(ScriptedSink::new(vec![false, false]));
        let client = Client::builder().with_sink(sink.clone()).build();

        client.service_check("db", "ok").unwrap();
        client.event("deploy", "done").unwrap();

        assert!(sink.sampled_rates().is_empty());
        assert_eq!(2, sink.emitted().len());
    }

    #[test]
    fn test_clone_with_prefix_option() {
        let (rx, spy) = SpyMetricSink::new();
        let original = Client::builder().with_sink(spy).build();
        let cloned = original.clone_with_options(|b| b.with_prefix("foo"));

        original.increment("metric").unwrap();
        cloned.increment("metric").unwrap();

        assert_eq!("metric:1|c", rx.try_recv().unwrap());
        assert_eq!("foo.metric:1|c", rx.try_recv().unwrap());
        assert_eq!(None, original.prefix());
    }

    #[test]
    fn test_clone_has_own_captures() {
        let original = Client::builder().build();
        let cloned = original.clone_with_options(|b| b);

        let got = original.capture(|| cloned.increment("metric").unwrap());
        assert!(got.is_empty());
    }

    #[test]
    fn test_capture_nesting() {
        let client = statsd_client();
        let mut inner = Vec::new();

        client.increment("foo").unwrap();
        let outer = client.capture(|| {
            client.increment("bar").unwrap();
            inner = client.capture(|| client.increment("baz").unwrap());
        });
        client.increment("quc").unwrap();

        let names = |ds: &[crate::Datagram]| ds.iter().map(|d| d.name().to_string()).collect::<Vec<_>>();
        assert_eq!(vec!["bar", "baz"], names(&outer));
        assert_eq!(vec!["baz"], names(&inner));
    }

    #[test]
    fn test_capture_still_delivers_to_sink() {
        let (rx, spy) = SpyMetricSink::new();
        let client = Client::from_sink("", spy);

        let got = client.capture(|| client.increment("foo").unwrap());

        assert_eq!(1, got.len());
        assert_eq!("foo:1|c", rx.try_recv().unwrap());
    }

    #[test]
    fn test_capture_released_on_panic() {
        let client = statsd_client();

        let res = panic::catch_unwind(AssertUnwindSafe(|| {
            client.capture(|| {
                assert!(client.is_capturing());
                panic!("boom");
            })
        }));

        assert!(res.is_err());
        assert!(!client.is_capturing());
    }

    #[test]
    fn test_send_routes_errors_to_handler() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler_count = count.clone();
        let client = Client::builder()
            .with_sink(ErrorMetricSink)
            .with_error_handler(move |e| {
                assert_eq!(ErrorKind::IoError, e.kind());
                handler_count.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        client.increment_with("foo").send();
        client.latency("foo").time(|| ());

        assert_eq!(2, count.load(Ordering::SeqCst));
    }

    #[test]
    fn test_try_send_surfaces_io_errors() {
        let client = Client::from_sink("", ErrorMetricSink);
        assert_eq!(ErrorKind::IoError, client.increment("foo").unwrap_err().kind());
    }

    #[test]
    fn test_latency_as_metric_type_rejected_by_statsd() {
        let client = statsd_client();
        let res = client
            .latency("foo")
            .as_metric_type(MetricType::Distribution)
            .try_time(|| ());
        assert_eq!(ErrorKind::UnsupportedMetricType, res.unwrap_err().kind());
    }

    #[test]
    fn test_flush_reaches_sink() {
        struct FlushCounter(AtomicUsize);

        impl MetricSink for FlushCounter {
            fn emit(&self, metric: &str) -> std::io::Result<usize> {
                Ok(metric.len())
            }

            fn flush(&self) -> std::io::Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let sink = Arc::new(FlushCounter(AtomicUsize::new(0)));
        let client = Client::builder().with_sink(sink.clone()).build();
        client.flush().unwrap();

        assert_eq!(1, sink.0.load(Ordering::SeqCst));
    }
}
