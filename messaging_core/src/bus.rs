//! Named event bus: ordered subscriber lists and one factory per event name.
//!
//! ```text
//! publish(name, args) ─► factory(name) ─► Event ─┬─► subscriber 1 (&Event)
//!                          │                      ├─► subscriber 2 (&Event)
//!                          └─ miss/fault: abort   └─► subscriber N (&Event)
//!                                                        │
//!                                      Event dropped ◄───┘
//! ```
//!
//! ## Rules
//! - Subscribers for one name run in registration order.
//! - A failing subscriber is recorded and skipped; the rest still run.
//! - A missing or failing factory aborts the publish before any subscriber.
//! - The event lives exactly as long as the publish call.
//! - Subscribers added while an event is being delivered see the next
//!   publish, not the current one.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, error};

use crate::event::Event;
use crate::fault::{guarded, Fault, FaultKind};
use crate::handler::{Dispatch, Factory, HandlerId, Subscriber};
use crate::value::{Args, Value};

/// Outcome of one publish call, for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The event reached every subscriber; `failed` of them faulted.
    Delivered { invoked: usize, failed: usize },
    /// Nothing was delivered.
    Aborted(FaultKind),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered { .. })
    }
}

#[derive(Default)]
pub(crate) struct EventBus {
    subscribers: RefCell<HashMap<String, Vec<(HandlerId, Subscriber)>>>,
    factories: RefCell<HashMap<String, Factory>>,
}

impl EventBus {
    pub fn subscribe(&self, name: &str, handler: Subscriber) -> HandlerId {
        let id = HandlerId::new();
        self.subscribers
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push((id, handler));
        debug!(event = name, handler = %id, "Subscriber registered");
        id
    }

    /// Install the factory for `name`. Returns true if one was replaced.
    pub fn register_factory(&self, name: &str, factory: Factory) -> bool {
        self.factories
            .borrow_mut()
            .insert(name.to_string(), factory)
            .is_some()
    }

    pub fn clear_factories(&self) {
        self.factories.borrow_mut().clear();
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscribers.borrow().get(name).map_or(0, Vec::len)
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.borrow().contains_key(name)
    }

    /// Build an event with the registered factory and deliver it.
    pub fn publish(&self, name: &str, args: &[Value], ctx: Dispatch<'_>) -> Delivery {
        let factory = self.factories.borrow().get(name).cloned();
        let Some(factory) = factory else {
            error!(event = name, "No factory registered, event dropped");
            ctx.faults.record(Fault {
                kind: FaultKind::MissingFactory,
                channel: name.to_string(),
                handler: None,
                detail: "no factory registered".to_string(),
            });
            return Delivery::Aborted(FaultKind::MissingFactory);
        };

        let built = guarded(ctx.config.isolate_panics, || factory(&Args::new(args)))
            .and_then(|result| result.map_err(|e| e.to_string()));

        match built {
            Ok(event) => self.deliver(name, event, ctx),
            Err(detail) => {
                error!(event = name, error = %detail, "Error when creating event");
                ctx.faults.record(Fault {
                    kind: FaultKind::Construction,
                    channel: name.to_string(),
                    handler: None,
                    detail,
                });
                Delivery::Aborted(FaultKind::Construction)
            }
        }
    }

    /// Deliver an already built event to every subscriber of `name`.
    pub fn deliver(&self, name: &str, event: Event, ctx: Dispatch<'_>) -> Delivery {
        let subscribers = self
            .subscribers
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default();

        let mut failed = 0;
        for (id, subscriber) in &subscribers {
            let outcome = guarded(ctx.config.isolate_panics, || subscriber(&event))
                .and_then(|result| result.map_err(|e| e.to_string()));

            if let Err(detail) = outcome {
                failed += 1;
                error!(event = name, handler = %id, error = %detail, "Error when broadcasting event");
                ctx.faults.record(Fault {
                    kind: FaultKind::Subscriber,
                    channel: name.to_string(),
                    handler: Some(*id),
                    detail,
                });
            }
        }

        debug!(
            event = name,
            kind = event.kind(),
            invoked = subscribers.len(),
            failed,
            "Event delivered"
        );

        Delivery::Delivered {
            invoked: subscribers.len(),
            failed,
        }
    }
}
