// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A Statsd and DogStatsD client with scoped capture of the datagrams it
//! writes.
//!
//! ## Features
//!
//! * Plain Statsd and the DogStatsD extensions (tags, histograms,
//!   distributions, service checks, events), selected per client.
//! * Client-side sampling, decided by the sink the client writes to.
//! * Timing of blocks of code, reported even when the block panics.
//! * Nestable per-thread captures of every datagram a block of code
//!   writes, for asserting on metrics in tests.
//! * Pluggable sinks: UDP, a channel for integration tests, or your own
//!   implementation of `MetricSink`.
//!
//! ## Usage
//!
//! Simple usage of the client is demonstrated below. Note that the
//! `prelude` module is imported to bring the metric traits into scope.
//!
//! ```rust,no_run
//! use std::net::UdpSocket;
//! use statsd_instrument::prelude::*;
//! use statsd_instrument::{Client, UdpMetricSink, DEFAULT_PORT};
//!
//! let host = ("metrics.example.com", DEFAULT_PORT);
//! let socket = UdpSocket::bind("0.0.0.0:0").unwrap();
//! socket.set_nonblocking(true).unwrap();
//! let sink = UdpMetricSink::from(host, socket).unwrap();
//!
//! let client = Client::builder()
//!     .with_prefix("my.app")
//!     .with_sink(sink)
//!     .with_tag("env", "production")
//!     .build();
//!
//! client.increment("requests").unwrap();
//! client.measure("render.ms", 12).unwrap();
//! client.gauge_with("queue.depth", 7).with_sample_rate(0.5).send();
//!
//! let rows = client.latency("db.query").time(|| 3);
//! ```
//!
//! ### Dialects
//!
//! Clients speak DogStatsD unless built with `Dialect::Statsd`. A plain
//! Statsd client rejects the extensions with `UnsupportedMetricType` or
//! `UnsupportedFeature` errors instead of writing something the server
//! can't parse.
//!
//! ```rust
//! use statsd_instrument::prelude::*;
//! use statsd_instrument::{Client, Dialect, ErrorKind};
//!
//! let client = Client::builder().with_dialect(Dialect::Statsd).build();
//! let err = client.histogram("payload.bytes", 512).unwrap_err();
//!
//! assert_eq!(ErrorKind::UnsupportedMetricType, err.kind());
//! ```
//!
//! ### Capturing
//!
//! `Client::capture` returns what a block of code wrote, parsed into
//! `Datagram`s. Captures nest, and the datagrams are still written to the
//! client's sink.
//!
//! ```rust
//! use statsd_instrument::prelude::*;
//! use statsd_instrument::{Client, MetricType};
//!
//! let client = Client::builder().build();
//! let mut inner = Vec::new();
//!
//! let outer = client.capture(|| {
//!     client.increment("bar").unwrap();
//!     inner = client.capture(|| client.increment("baz").unwrap());
//! });
//!
//! assert_eq!(2, outer.len());
//! assert_eq!(1, inner.len());
//! assert_eq!("baz", inner[0].name());
//! assert_eq!(MetricType::Counter, inner[0].metric_type());
//! ```
//!
//! ### Error handling
//!
//! Every metric can be sent with `.try_send()`, which returns any error to
//! the caller, or `.send()`, which hands errors to the client's error
//! handler. The default handler logs them through the `log` crate at
//! `warn` level.
//!
//! ```rust
//! use statsd_instrument::prelude::*;
//! use statsd_instrument::{Client, MetricError, NopMetricSink};
//!
//! fn my_error_handler(err: MetricError) {
//!     eprintln!("Metric error! {}", err);
//! }
//!
//! let client = Client::builder()
//!     .with_sink(NopMetricSink)
//!     .with_error_handler(my_error_handler)
//!     .build();
//!
//! client.count_with("some.counter", 1).with_tag("region", "us-east-2").send();
//! ```

#![forbid(unsafe_code)]

pub const DEFAULT_PORT: u16 = 8125;

pub use self::builder::Dialect;

pub use self::client::{
    Client, ClientBuilder, Counted, CountedExt, Distributed, Evented, Gauged, Histogrammed, Measured, MetricClient,
    ServiceChecked, Setted,
};

pub use self::datagram::{Datagram, DatagramValue};

pub use self::metric::{EventBuilder, MetricBuilder, ServiceCheckBuilder, TimedBuilder};

pub use self::sinks::{CaptureSink, MetricSink, NopMetricSink, SinkStats, SpyMetricSink, UdpMetricSink};

pub use self::types::{
    ErrorKind, EventAlertType, EventPriority, MetricError, MetricResult, MetricType, ServiceCheckStatus,
};

mod builder;
mod capture;
mod client;
mod datagram;
pub mod ext;
mod metric;
pub mod prelude;
mod sinks;
mod timing;
mod types;
