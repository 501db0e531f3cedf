//! Fault records and panic isolation for bus-level failures.
//!
//! Bus faults never reach the publisher. They are logged and kept in a
//! bounded [`FaultLog`] so tools and tests can inspect what went wrong.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::handler::HandlerId;

/// Category of a recorded fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FaultKind {
    /// A publish named an event without a factory.
    MissingFactory,
    /// A factory failed while building the event.
    Construction,
    /// A subscriber failed while handling an event.
    Subscriber,
    /// A special-event handler failed.
    SpecialSubscriber,
    /// A special-request handler panicked.
    SpecialRequest,
}

/// One recorded fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    pub kind: FaultKind,
    /// Event or channel name the fault happened on.
    pub channel: String,
    /// The failing handler, when one was involved.
    pub handler: Option<HandlerId>,
    pub detail: String,
}

/// Bounded, oldest-first record of faults.
#[derive(Debug, Default)]
pub struct FaultLog {
    capacity: usize,
    entries: RefCell<VecDeque<Fault>>,
}

impl FaultLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RefCell::new(VecDeque::new()),
        }
    }

    pub fn record(&self, fault: Fault) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.borrow_mut();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(fault);
    }

    /// Snapshot of all recorded faults, oldest first.
    pub fn snapshot(&self) -> Vec<Fault> {
        self.entries.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Run `f`, turning a panic into `Err(message)` when `isolate` is set.
pub(crate) fn guarded<R>(isolate: bool, f: impl FnOnce() -> R) -> Result<R, String> {
    if !isolate {
        return Ok(f());
    }
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
