// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use super::{
    escape_newlines, tags_size_hint, write_name, write_tags, DatagramBuilder, Dialect, EventOptions,
    ServiceCheckOptions, Tag,
};
use crate::types::{MetricResult, MetricType, ServiceCheckStatus};
use std::fmt::Write;

/// Builder for Datadog's extended Statsd dialect.
///
/// In addition to everything plain Statsd supports, this dialect can carry
/// tags and express histograms, distributions, service checks, and events.
/// See the [DogStatsD datagram docs](https://docs.datadoghq.com/developers/dogstatsd/datagram_shell/).
///
/// ``` text
/// some.histogram:12.44|h|#host:web01,beta
/// _sc|some.service|0|#env:prod
/// _e{7,18}:service|event\ndescription
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DogStatsdDatagramBuilder;

impl DatagramBuilder for DogStatsdDatagramBuilder {
    fn dialect(&self) -> Dialect {
        Dialect::DogStatsd
    }

    fn supports(&self, _metric_type: MetricType) -> bool {
        true
    }

    fn supports_tags(&self) -> bool {
        true
    }

    fn latency_metric_type(&self) -> MetricType {
        MetricType::Distribution
    }

    fn render_service_check(
        &self,
        name: &str,
        status: ServiceCheckStatus,
        options: &ServiceCheckOptions<'_>,
        tags: &[Tag<'_>],
    ) -> MetricResult<String> {
        self.validate(MetricType::ServiceCheck, tags)?;

        let mut out = String::with_capacity(name.len() + 8 + tags_size_hint(tags));
        out.push_str("_sc|");
        write_name(&mut out, name);
        let _ = write!(out, "|{}", status);

        if let Some(hostname) = options.hostname {
            let _ = write!(out, "|h:{}", hostname);
        }
        if let Some(timestamp) = options.timestamp {
            let _ = write!(out, "|d:{}", timestamp);
        }
        write_tags(&mut out, tags);
        if let Some(message) = options.message {
            let _ = write!(out, "|m:{}", escape_newlines(message));
        }

        Ok(out)
    }

    fn render_event(
        &self,
        title: &str,
        text: &str,
        options: &EventOptions<'_>,
        tags: &[Tag<'_>],
    ) -> MetricResult<String> {
        self.validate(MetricType::Event, tags)?;

        let title = escape_newlines(title);
        let text = escape_newlines(text);

        let mut out = String::with_capacity(title.len() + text.len() + 16 + tags_size_hint(tags));
        let _ = write!(out, "_e{{{},{}}}:{}|{}", title.len(), text.len(), title, text);

        if let Some(hostname) = options.hostname {
            let _ = write!(out, "|h:{}", hostname);
        }
        if let Some(timestamp) = options.timestamp {
            let _ = write!(out, "|d:{}", timestamp);
        }
        if let Some(key) = options.aggregation_key {
            let _ = write!(out, "|k:{}", key);
        }
        if let Some(priority) = options.priority {
            let _ = write!(out, "|p:{}", priority);
        }
        if let Some(source_type) = options.source_type_name {
            let _ = write!(out, "|s:{}", source_type);
        }
        if let Some(alert_type) = options.alert_type {
            let _ = write!(out, "|t:{}", alert_type);
        }
        write_tags(&mut out, tags);

        Ok(out)
    }
}
