// statsd-instrument - Statsd instrumentation with scoped datagram capture
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-thread stacks of active captures.
//!
//! Every client has its own stack on every thread. Frames are pushed by
//! `Client::capture` and popped by the returned guard when it is dropped,
//! including while unwinding, so a panicking block never leaves a stale
//! frame behind.

use crate::sinks::CaptureSink;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

thread_local! {
    static STACKS: RefCell<HashMap<u64, Vec<Arc<CaptureSink>>>> = RefCell::new(HashMap::new());
}

/// Innermost active capture of `client_id` on this thread.
pub(crate) fn current(client_id: u64) -> Option<Arc<CaptureSink>> {
    STACKS
        .try_with(|stacks| {
            stacks
                .borrow()
                .get(&client_id)
                .and_then(|stack| stack.last().cloned())
        })
        .ok()
        .flatten()
}

/// Number of active captures of `client_id` on this thread.
pub(crate) fn depth(client_id: u64) -> usize {
    STACKS
        .try_with(|stacks| stacks.borrow().get(&client_id).map_or(0, Vec::len))
        .unwrap_or(0)
}

/// Make `sink` the innermost capture of `client_id` until the guard drops.
pub(crate) fn push(client_id: u64, sink: Arc<CaptureSink>) -> CaptureGuard {
    let depth = STACKS.with(|stacks| {
        let mut stacks = stacks.borrow_mut();
        let stack = stacks.entry(client_id).or_default();
        stack.push(sink);
        stack.len()
    });

    log::trace!("entered capture for client {} at depth {}", client_id, depth);
    CaptureGuard {
        client_id,
        depth,
        _not_send: PhantomData,
    }
}

/// Pops its frame when dropped. Tied to the thread that pushed it.
#[derive(Debug)]
pub(crate) struct CaptureGuard {
    client_id: u64,
    depth: usize,
    _not_send: PhantomData<Rc<()>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        let client_id = self.client_id;
        let depth = self.depth;

        let _ = STACKS.try_with(|stacks| {
            let mut stacks = stacks.borrow_mut();
            if let Some(stack) = stacks.get_mut(&client_id) {
                // Guards drop in reverse order of creation, so everything
                // above our frame is already gone.
                stack.truncate(depth - 1);
                if stack.is_empty() {
                    stacks.remove(&client_id);
                }
            }
        });

        log::trace!("left capture for client {} at depth {}", client_id, depth);
    }
}
