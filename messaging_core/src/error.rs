//! Error types for the messaging core.
//!
//! Two kinds of failure exist:
//!
//! - [`MessagingError`] is returned by capability dispatch, argument decoding
//!   and configuration loading.
//! - [`HandlerError`] is what subscribers and special-event handlers return
//!   when they cannot handle a delivery. The bus turns it into a fault record
//!   and keeps delivering.

use thiserror::Error;

use crate::capability::{CapabilityTag, Table};

/// Errors raised by the messaging core.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// No factory is registered for the published event name.
    #[error("no factory registered for event '{0}'")]
    MissingFactory(String),

    /// No handler is registered for the capability in the given table.
    #[error("no {table} handler registered for capability '{tag}'")]
    MissingHandler { table: Table, tag: CapabilityTag },

    /// Two capability types declare the same tag.
    #[error("capability tag '{tag}' is owned by {owner}, not {requested}")]
    TagCollision {
        tag: CapabilityTag,
        owner: &'static str,
        requested: &'static str,
    },

    /// A fetch handler produced a value of the wrong kind.
    #[error("fetch handler for '{tag}' produced {found}, expected {expected}")]
    TypeMismatch {
        tag: CapabilityTag,
        expected: &'static str,
        found: String,
    },

    /// A factory asked for an argument the publisher did not supply.
    #[error("missing argument at position {index}")]
    MissingArgument { index: usize },

    /// A factory argument had the wrong kind.
    #[error("argument {index} is {found}, expected {expected}")]
    ArgumentType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// A value could not be decoded into the requested type.
    #[error("cannot decode {found} as {expected}")]
    Decode {
        expected: &'static str,
        found: String,
    },

    /// A value could not be encoded as a record.
    #[error("cannot encode record: {0}")]
    Encode(String),

    /// A factory failed for a reason of its own.
    #[error("event construction failed: {0}")]
    Construction(String),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure reported by a subscriber or special-event handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler received an event variant it does not understand.
    #[error("unexpected event: expected {expected}, got {found}")]
    UnexpectedEvent {
        expected: &'static str,
        found: &'static str,
    },

    /// Free-form failure.
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Build a free-form handler failure.
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }
}
