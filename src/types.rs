// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::error;
use std::fmt;
use std::io;
use std::str::FromStr;

/// Kind of metric a datagram describes.
///
/// Not every dialect supports every kind: histograms, distributions,
/// service checks, and events are DogStatsD extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    Counter,
    Gauge,
    Set,
    Timing,
    Histogram,
    Distribution,
    ServiceCheck,
    Event,
}

impl MetricType {
    /// The type marker used on the wire, `c` for counters, `ms` for timings, etc.
    pub fn as_str(&self) -> &'static str {
        match *self {
            MetricType::Counter => "c",
            MetricType::Gauge => "g",
            MetricType::Set => "s",
            MetricType::Timing => "ms",
            MetricType::Histogram => "h",
            MetricType::Distribution => "d",
            MetricType::ServiceCheck => "_sc",
            MetricType::Event => "_e",
        }
    }

    pub(crate) fn from_wire(s: &str) -> Option<MetricType> {
        match s {
            "c" => Some(MetricType::Counter),
            "g" => Some(MetricType::Gauge),
            "s" => Some(MetricType::Set),
            "ms" => Some(MetricType::Timing),
            "h" => Some(MetricType::Histogram),
            "d" => Some(MetricType::Distribution),
            _ => None,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// Health state reported by a service check.
///
/// See the [DogStatsD docs](https://docs.datadoghq.com/developers/dogstatsd/datagram_shell/#service-checks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceCheckStatus {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceCheckStatus {
    /// Numeric code written on the wire.
    pub fn code(&self) -> u8 {
        match *self {
            ServiceCheckStatus::Ok => 0,
            ServiceCheckStatus::Warning => 1,
            ServiceCheckStatus::Critical => 2,
            ServiceCheckStatus::Unknown => 3,
        }
    }
}

impl fmt::Display for ServiceCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.code().fmt(f)
    }
}

impl TryFrom<u8> for ServiceCheckStatus {
    type Error = MetricError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ServiceCheckStatus::Ok),
            1 => Ok(ServiceCheckStatus::Warning),
            2 => Ok(ServiceCheckStatus::Critical),
            3 => Ok(ServiceCheckStatus::Unknown),
            _ => Err(invalid_status_error()),
        }
    }
}

impl FromStr for ServiceCheckStatus {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(ServiceCheckStatus::Ok),
            "warning" => Ok(ServiceCheckStatus::Warning),
            "critical" => Ok(ServiceCheckStatus::Critical),
            "unknown" => Ok(ServiceCheckStatus::Unknown),
            _ => Err(invalid_status_error()),
        }
    }
}

fn invalid_status_error() -> MetricError {
    MetricError::from((
        ErrorKind::InvalidArgument,
        "Service check status must be one of ok, warning, critical, or unknown",
    ))
}

/// The priority of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventPriority {
    Low,
    #[default]
    Normal,
}

impl fmt::Display for EventPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            EventPriority::Low => "low".fmt(f),
            EventPriority::Normal => "normal".fmt(f),
        }
    }
}

/// The alert type of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventAlertType {
    Error,
    Warning,
    #[default]
    Info,
    Success,
}

impl fmt::Display for EventAlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            EventAlertType::Error => "error".fmt(f),
            EventAlertType::Warning => "warning".fmt(f),
            EventAlertType::Info => "info".fmt(f),
            EventAlertType::Success => "success".fmt(f),
        }
    }
}

/// Potential categories an error from this library falls into.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ErrorKind {
    UnsupportedMetricType,
    UnsupportedFeature,
    InvalidArgument,
    IoError,
}

/// Error generated by this library potentially wrapping another
/// type of error (exposed via the `Error` trait).
#[derive(Debug)]
pub struct MetricError {
    repr: ErrorRepr,
}

#[derive(Debug)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    IoError(io::Error),
}

impl MetricError {
    /// Return the kind of the error
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::IoError(_) => ErrorKind::IoError,
            ErrorRepr::WithDescription(kind, _) => kind,
        }
    }

    pub(crate) fn unsupported_metric_type() -> MetricError {
        MetricError::from((
            ErrorKind::UnsupportedMetricType,
            "Metric type is not supported by the selected dialect",
        ))
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            ErrorRepr::IoError(ref err) => err.fmt(f),
            ErrorRepr::WithDescription(_, desc) => desc.fmt(f),
        }
    }
}

impl error::Error for MetricError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.repr {
            ErrorRepr::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for MetricError {
    fn from(err: io::Error) -> MetricError {
        MetricError {
            repr: ErrorRepr::IoError(err),
        }
    }
}

impl From<(ErrorKind, &'static str)> for MetricError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> MetricError {
        MetricError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

pub type MetricResult<T> = Result<T, MetricError>;
