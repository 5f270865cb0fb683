// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use quanta::{Clock, Instant};
use std::time::Duration;

/// Run `block` once and hand the time it took to `report`.
///
/// `report` is called after `block` returns and also while unwinding if
/// `block` panics, in which case the panic continues unchanged afterwards.
pub(crate) fn time_block<F, R, E>(clock: &Clock, block: F, report: E) -> R
where
    F: FnOnce() -> R,
    E: FnOnce(Duration),
{
    let _timer = ReportOnDrop {
        clock,
        start: clock.now(),
        report: Some(report),
    };

    block()
}

struct ReportOnDrop<'a, E: FnOnce(Duration)> {
    clock: &'a Clock,
    start: Instant,
    report: Option<E>,
}

impl<'a, E: FnOnce(Duration)> Drop for ReportOnDrop<'a, E> {
    fn drop(&mut self) {
        if let Some(report) = self.report.take() {
            report(self.clock.now().duration_since(self.start));
        }
    }
}
