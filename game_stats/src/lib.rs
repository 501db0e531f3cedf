//! # Game Stats
//!
//! Statistics tracker built on `messaging_core`. It never calls other
//! subsystems directly: game flow arrives as `GAMEOVER`, `RESTART` and
//! `BUTTON_CLICK` events through the messenger.
//!
//! - **stat**: individual stat values
//! - **groups**: Game / Session / Lifetime groups and roll-up rules
//! - **tracker**: the subsystem reacting to events
//! - **persist**: JSON save and load

pub mod error;
pub mod groups;
pub mod persist;
pub mod stat;
pub mod tracker;

pub use error::*;
pub use groups::*;
pub use persist::*;
pub use stat::*;
pub use tracker::*;
