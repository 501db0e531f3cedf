//! Stat values and their arithmetic.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single tracked statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl StatValue {
    pub fn kind(&self) -> &'static str {
        match self {
            StatValue::Int(_) => "int",
            StatValue::Float(_) => "float",
            StatValue::Text(_) => "text",
        }
    }

    /// Add `amount` to this stat.
    ///
    /// Only same-kind numbers add; anything else leaves the stat unchanged.
    /// Returns whether the stat changed.
    pub fn increment(&mut self, amount: &StatValue) -> bool {
        match (self, amount) {
            (StatValue::Int(x), StatValue::Int(y)) => {
                *x = x.saturating_add(*y);
                true
            }
            (StatValue::Float(x), StatValue::Float(y)) => {
                *x += y;
                true
            }
            _ => false,
        }
    }

    /// Zero the stat while keeping its kind.
    pub fn reset(&mut self) {
        *self = match self {
            StatValue::Int(_) => StatValue::Int(0),
            StatValue::Float(_) => StatValue::Float(0.0),
            StatValue::Text(_) => StatValue::Text(String::new()),
        };
    }
}

// Values of different kinds are unordered.
impl PartialOrd for StatValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (StatValue::Int(x), StatValue::Int(y)) => x.partial_cmp(y),
            (StatValue::Float(x), StatValue::Float(y)) => x.partial_cmp(y),
            (StatValue::Text(x), StatValue::Text(y)) => x.partial_cmp(y),
            _ => None,
        }
    }
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Int(v)
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        StatValue::Float(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_string())
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{v}"),
            StatValue::Float(v) => write!(f, "{v:.2}"),
            StatValue::Text(v) => f.write_str(v),
        }
    }
}
