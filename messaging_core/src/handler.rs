//! Handler identities and the callable shapes stored by the messenger.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::MessengerConfig;
use crate::entity::EntityId;
use crate::error::{HandlerError, MessagingError};
use crate::event::Event;
use crate::fault::FaultLog;
use crate::value::{Args, Value};

/// Identity minted for every subscriber and special-event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub Uuid);

impl HandlerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type Subscriber = Rc<dyn Fn(&Event) -> Result<(), HandlerError>>;
pub type Factory = Rc<dyn Fn(&Args<'_>) -> Result<Event, MessagingError>>;

pub type ExistsFn = Rc<dyn Fn(EntityId) -> bool>;
pub type FetchFn = Rc<dyn Fn(EntityId) -> Option<Value>>;
pub type CreateFn = Rc<dyn Fn(&str, EntityId)>;
pub type ToggleFn = Rc<dyn Fn(EntityId, bool)>;

pub type SpecialHandler = Rc<dyn Fn(EntityId) -> Result<(), HandlerError>>;
pub type RequestHandler = Rc<dyn Fn(&str) -> Option<EntityId>>;

/// Shared state every dispatch path consults.
#[derive(Clone, Copy)]
pub(crate) struct Dispatch<'a> {
    pub config: &'a MessengerConfig,
    pub faults: &'a FaultLog,
}
