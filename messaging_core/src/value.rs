//! Tagged values passed to event factories and returned by fetch handlers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::MessagingError;

/// A dynamically produced value with a closed set of kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Entity(EntityId),
    /// Structured payload, decoded on the receiving side with serde.
    Record(serde_json::Value),
}

impl Value {
    /// Name of this value's kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Entity(_) => "entity",
            Value::Record(_) => "record",
        }
    }

    /// Wrap any serializable value as a record.
    pub fn record<T: Serialize>(value: &T) -> Result<Self, MessagingError> {
        serde_json::to_value(value)
            .map(Value::Record)
            .map_err(|e| MessagingError::Encode(e.to_string()))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<EntityId> for Value {
    fn from(v: EntityId) -> Self {
        Value::Entity(v)
    }
}

/// Build an argument list for [`Messenger::publish`](crate::Messenger::publish).
///
/// ```
/// use messaging_core::args;
/// let list = args!["GAMEPLAY", 3, 1.5];
/// assert_eq!(list.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    ($($v:expr),* $(,)?) => {
        ::std::vec![$($crate::Value::from($v)),*]
    };
}

/// Read-only view over the arguments a publisher handed to a factory.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value at `index`.
    pub fn get(&self, index: usize) -> Result<&'a Value, MessagingError> {
        self.values
            .get(index)
            .ok_or(MessagingError::MissingArgument { index })
    }

    pub fn boolean(&self, index: usize) -> Result<bool, MessagingError> {
        match self.get(index)? {
            Value::Bool(v) => Ok(*v),
            other => Err(mismatch(index, "bool", other)),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64, MessagingError> {
        match self.get(index)? {
            Value::Int(v) => Ok(*v),
            other => Err(mismatch(index, "int", other)),
        }
    }

    /// Float argument; integer arguments are widened.
    pub fn float(&self, index: usize) -> Result<f64, MessagingError> {
        match self.get(index)? {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => Err(mismatch(index, "float", other)),
        }
    }

    pub fn text(&self, index: usize) -> Result<&'a str, MessagingError> {
        match self.get(index)? {
            Value::Text(v) => Ok(v.as_str()),
            other => Err(mismatch(index, "text", other)),
        }
    }

    /// Entity argument; plain integers are accepted as raw IDs.
    pub fn entity(&self, index: usize) -> Result<EntityId, MessagingError> {
        match self.get(index)? {
            Value::Entity(v) => Ok(*v),
            Value::Int(v) => Ok(EntityId(*v)),
            other => Err(mismatch(index, "entity", other)),
        }
    }
}

fn mismatch(index: usize, expected: &'static str, found: &Value) -> MessagingError {
    MessagingError::ArgumentType {
        index,
        expected,
        found: found.kind(),
    }
}

/// Decoding from a [`Value`] into a concrete type.
pub trait FromValue: Sized {
    /// Human-readable name of the target type.
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Result<Self, MessagingError>;
}

fn decode_error(expected: &'static str, value: &Value) -> MessagingError {
    MessagingError::Decode {
        expected,
        found: value.kind().to_string(),
    }
}

impl FromValue for Value {
    const EXPECTED: &'static str = "value";

    fn from_value(value: Value) -> Result<Self, MessagingError> {
        Ok(value)
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, MessagingError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(decode_error(Self::EXPECTED, &other)),
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: Value) -> Result<Self, MessagingError> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(decode_error(Self::EXPECTED, &other)),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Result<Self, MessagingError> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(decode_error(Self::EXPECTED, &other)),
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: Value) -> Result<Self, MessagingError> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(decode_error(Self::EXPECTED, &other)),
        }
    }
}

impl FromValue for EntityId {
    const EXPECTED: &'static str = "entity";

    fn from_value(value: Value) -> Result<Self, MessagingError> {
        match value {
            Value::Entity(v) => Ok(v),
            other => Err(decode_error(Self::EXPECTED, &other)),
        }
    }
}

/// Decode a [`Value::Record`] into `T` with serde.
///
/// Intended for `FromValue` impls of component types:
///
/// ```
/// use messaging_core::{decode_record, FromValue, MessagingError, Value};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Health { current: i32 }
///
/// impl FromValue for Health {
///     const EXPECTED: &'static str = "Health";
///     fn from_value(value: Value) -> Result<Self, MessagingError> {
///         decode_record(value, Self::EXPECTED)
///     }
/// }
/// ```
pub fn decode_record<T: DeserializeOwned>(
    value: Value,
    expected: &'static str,
) -> Result<T, MessagingError> {
    match value {
        Value::Record(json) => serde_json::from_value(json).map_err(|e| MessagingError::Decode {
            expected,
            found: format!("record ({e})"),
        }),
        other => Err(decode_error(expected, &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_args_macro_converts() {
        let list = crate::args!["JUMP", 2, 0.5_f64, true];
        assert_eq!(
            list,
            vec![
                Value::Text("JUMP".to_string()),
                Value::Int(2),
                Value::Float(0.5),
                Value::Bool(true),
            ]
        );
    }

    #[test]
    fn test_args_accessors() {
        let list = crate::args!["JUMP", 2, EntityId(9)];
        let args = Args::new(&list);

        assert_eq!(args.text(0).unwrap(), "JUMP");
        assert_eq!(args.int(1).unwrap(), 2);
        assert_eq!(args.float(1).unwrap(), 2.0);
        assert_eq!(args.entity(2).unwrap(), EntityId(9));
        assert_eq!(args.entity(1).unwrap(), EntityId(2));
    }

    #[test]
    fn test_args_errors() {
        let list = crate::args!["JUMP"];
        let args = Args::new(&list);

        assert!(matches!(
            args.int(0),
            Err(MessagingError::ArgumentType {
                index: 0,
                expected: "int",
                found: "text"
            })
        ));
        assert!(matches!(
            args.text(1),
            Err(MessagingError::MissingArgument { index: 1 })
        ));
    }

    #[test]
    fn test_from_value_mismatch() {
        assert!(bool::from_value(Value::Bool(true)).unwrap());
        assert!(matches!(
            i64::from_value(Value::Text("x".to_string())),
            Err(MessagingError::Decode { expected: "int", .. })
        ));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[test]
    fn test_decode_record() {
        let value = Value::record(&Position { x: 1.0, y: 2.0 }).unwrap();
        let decoded: Position = decode_record(value, "Position").unwrap();
        assert_eq!(decoded, Position { x: 1.0, y: 2.0 });

        let wrong = decode_record::<Position>(Value::Int(3), "Position");
        assert!(matches!(wrong, Err(MessagingError::Decode { .. })));
    }

    #[test]
    fn test_record_encode_failure() {
        // JSON objects need string keys.
        let mut grid = std::collections::HashMap::new();
        grid.insert((1, 2), 3);

        let result = Value::record(&grid);
        assert!(matches!(result, Err(MessagingError::Encode(_))));
    }
}
