//! Messenger configuration, loadable from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::MessagingError;

/// Tunables for a [`Messenger`](crate::Messenger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessengerConfig {
    /// Log a warning when a factory or capability handler is replaced.
    pub warn_on_overwrite: bool,

    /// Catch panics raised by factories, subscribers and special handlers.
    pub isolate_panics: bool,

    /// Maximum number of fault records kept. Zero disables recording.
    pub fault_log_capacity: usize,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            warn_on_overwrite: true,
            isolate_panics: true,
            fault_log_capacity: 256,
        }
    }
}

impl MessengerConfig {
    /// Parse a configuration from TOML text. Missing keys use defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, MessagingError> {
        toml::from_str(text).map_err(|e| MessagingError::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MessagingError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
