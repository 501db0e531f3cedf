//! Special channels: string-keyed paths that carry only an entity ID or a
//! name, for cross-cutting concerns that need no typed event.
//!
//! - Special events fan an [`EntityId`] out to every handler registered for
//!   a name (e.g. `ENTITY_DELETED`), with the same fault isolation as the bus.
//! - Special requests resolve a name to an optional [`EntityId`] through a
//!   single handler (e.g. `FIND_BY_NAME`). They never fail: an unknown
//!   channel or a faulting handler both resolve to `None`.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, error};

use crate::bus::Delivery;
use crate::entity::EntityId;
use crate::fault::{guarded, Fault, FaultKind};
use crate::handler::{Dispatch, HandlerId, RequestHandler, SpecialHandler};

#[derive(Default)]
pub(crate) struct SpecialChannels {
    events: RefCell<HashMap<String, Vec<(HandlerId, SpecialHandler)>>>,
    requests: RefCell<HashMap<String, RequestHandler>>,
}

impl SpecialChannels {
    pub fn register_event(&self, name: &str, handler: SpecialHandler) -> HandlerId {
        let id = HandlerId::new();
        self.events
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push((id, handler));
        debug!(channel = name, handler = %id, "Special event handler registered");
        id
    }

    /// Install the request handler for `name`. Returns true if one was replaced.
    pub fn register_request(&self, name: &str, handler: RequestHandler) -> bool {
        self.requests
            .borrow_mut()
            .insert(name.to_string(), handler)
            .is_some()
    }

    pub fn handler_count(&self, name: &str) -> usize {
        self.events.borrow().get(name).map_or(0, Vec::len)
    }

    pub fn has_request(&self, name: &str) -> bool {
        self.requests.borrow().contains_key(name)
    }

    pub fn publish(&self, name: &str, id: EntityId, ctx: Dispatch<'_>) -> Delivery {
        let handlers = self.events.borrow().get(name).cloned().unwrap_or_default();

        let mut failed = 0;
        for (handler_id, handler) in &handlers {
            let outcome = guarded(ctx.config.isolate_panics, || handler(id))
                .and_then(|result| result.map_err(|e| e.to_string()));

            if let Err(detail) = outcome {
                failed += 1;
                error!(
                    channel = name,
                    entity = %id,
                    handler = %handler_id,
                    error = %detail,
                    "Error when broadcasting special event"
                );
                ctx.faults.record(Fault {
                    kind: FaultKind::SpecialSubscriber,
                    channel: name.to_string(),
                    handler: Some(*handler_id),
                    detail,
                });
            }
        }

        Delivery::Delivered {
            invoked: handlers.len(),
            failed,
        }
    }

    pub fn request(&self, name: &str, arg: &str, ctx: Dispatch<'_>) -> Option<EntityId> {
        let handler = self.requests.borrow().get(name).cloned();
        let Some(handler) = handler else {
            debug!(channel = name, arg, "No special request handler registered");
            return None;
        };

        match guarded(ctx.config.isolate_panics, || handler(arg)) {
            Ok(found) => found,
            Err(detail) => {
                error!(channel = name, arg, error = %detail, "Error when handling special request");
                ctx.faults.record(Fault {
                    kind: FaultKind::SpecialRequest,
                    channel: name.to_string(),
                    handler: None,
                    detail,
                });
                None
            }
        }
    }
}
