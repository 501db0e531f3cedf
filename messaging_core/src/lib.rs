//! # Messaging Core
//!
//! In-process communication hub that lets independently built subsystems
//! interact without depending on each other at compile time.
//!
//! ## Core Components
//!
//! - **bus**: named publish/subscribe with one event factory per name
//! - **capability**: exists / fetch / create / toggle tables keyed by capability tag
//! - **special**: entity-ID notifications and name-to-ID requests
//! - **messenger**: the registry object tying these together, plus its lifecycle
//!
//! ## Delivery Rules
//!
//! - Everything runs synchronously on the caller's stack; nothing is queued.
//! - Bus faults (missing factory, failing factory, failing subscriber) are
//!   logged and recorded, never returned to the publisher.
//! - Capability calls return `Err` when no owner registered a handler or the
//!   fetched value has the wrong kind.

pub mod bringup;
pub mod bus;
pub mod capability;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod fault;
pub mod handler;
pub mod messenger;
pub mod special;
pub mod value;

pub use bringup::*;
pub use bus::Delivery;
pub use capability::{Capability, CapabilityTag, Table};
pub use config::*;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use fault::{Fault, FaultKind, FaultLog};
pub use handler::HandlerId;
pub use messenger::*;
pub use value::*;
