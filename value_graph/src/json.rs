//! Conversion between simulated graphs and wire JSON
//!
//! Simulated output is plain data (functions already replaced by wrapped
//! tickets), so it converts losslessly to JSON for the envelope payload.
//! Callables and platform values refuse serialization explicitly.

use crate::value::{Key, MapObject, Value};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};
use thiserror::Error;

/// Key prefix carrying symbol-like keys through JSON objects
const SYMBOL_PREFIX: &str = "@sym:";

/// Errors converting values to wire JSON
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("Value cannot be serialized for the wire: {0}")]
    Unserializable(&'static str),
}

/// Converts a simulated (function-free) value into wire JSON
pub fn to_json(value: &Value) -> Result<JsonValue, ValueError> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Int(n) => Ok(JsonValue::Number((*n).into())),
        Value::Float(n) => Number::from_f64(*n)
            .map(JsonValue::Number)
            .ok_or(ValueError::Unserializable("non-finite float")),
        Value::Str(s) => Ok(JsonValue::String(s.clone())),
        Value::Func(_) => Err(ValueError::Unserializable("local function")),
        Value::Stub(_) => Err(ValueError::Unserializable("remote stub")),
        Value::Seq(items) => {
            let mut out = Vec::new();
            for item in items.borrow().iter() {
                out.push(to_json(item)?);
            }
            Ok(JsonValue::Array(out))
        }
        Value::Map(map) => {
            let mut out = JsonMap::new();
            for (key, child) in map.borrow().entries() {
                let name = match key {
                    Key::Name(name) => name.clone(),
                    Key::Symbol(name) => format!("{}{}", SYMBOL_PREFIX, name),
                };
                out.insert(name, to_json(child)?);
            }
            Ok(JsonValue::Object(out))
        }
        Value::Instance(_) => Err(ValueError::Unserializable("prototyped object")),
        Value::Foreign(_) => Err(ValueError::Unserializable("platform value")),
    }
}

/// Converts wire JSON back into a value graph
pub fn from_json(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::Str(s.clone()),
        JsonValue::Array(items) => Value::seq(items.iter().map(from_json).collect()),
        JsonValue::Object(entries) => {
            let mut map = MapObject::new();
            for (name, child) in entries {
                let key = match name.strip_prefix(SYMBOL_PREFIX) {
                    Some(symbol) => Key::symbol(symbol),
                    None => Key::name(name),
                };
                map.set(key, from_json(child));
            }
            Value::map(map)
        }
    }
}
