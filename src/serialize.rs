//! Pluggable JSON mapping for headers and claims
//!
//! The builder serializes through a [`Serializer`] and the parser reads
//! through a [`Deserializer`]. [`JsonSerializer`] implements both with
//! `serde_json` and keeps member order intact.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Turns an ordered JSON object into bytes
pub trait Serializer: Send + Sync {
    fn serialize(&self, map: &Map<String, Value>) -> Result<Vec<u8>>;
}

/// Turns bytes into an ordered JSON object
pub trait Deserializer: Send + Sync {
    fn deserialize(&self, bytes: &[u8]) -> Result<Map<String, Value>>;
}

/// Default mapping backed by `serde_json`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, map: &Map<String, Value>) -> Result<Vec<u8>> {
        serde_json::to_vec(map)
            .map_err(|e| Error::Serialization(format!("Unable to serialize object to JSON: {e}")))
    }
}

impl Deserializer for JsonSerializer {
    fn deserialize(&self, bytes: &[u8]) -> Result<Map<String, Value>> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::Serialization(format!(
                "Expected a JSON object, found {}",
                kind_of(&other)
            ))),
            Err(e) => Err(Error::Serialization(format!("Unable to read JSON value: {e}"))),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
