//! Field converters.
//!
//! A field that declares a converter (see [`FieldInfo::converter`]) has its
//! storage value passed through that converter before it is assigned to the
//! model. Applications register their own converters by name; the library
//! ships the small set below, used when no application converter matches.
//!
//! [`FieldInfo::converter`]: crate::FieldInfo::converter

use crate::error::{Error, Result, TypeError};
use crate::value::Value;
use std::sync::Arc;

/// Converts a raw storage value into the value assigned to a model field.
pub trait FieldConverter: Send + Sync {
    fn from_db(&self, value: &Value) -> Result<Value>;
}

impl<F> FieldConverter for F
where
    F: Fn(&Value) -> Result<Value> + Send + Sync,
{
    fn from_db(&self, value: &Value) -> Result<Value> {
        self(value)
    }
}

/// Names of the converters supplied by the library.
pub const LIBRARY_CONVERTERS: &[&str] = &["Integer", "Float", "Boolean", "Text", "Json"];

/// Look up a library converter by name.
pub fn library_converter(name: &str) -> Option<Arc<dyn FieldConverter>> {
    let converter: Arc<dyn FieldConverter> = match name {
        "Integer" => Arc::new(IntegerConverter),
        "Float" => Arc::new(FloatConverter),
        "Boolean" => Arc::new(BooleanConverter),
        "Text" => Arc::new(TextConverter),
        "Json" => Arc::new(JsonConverter),
        _ => return None,
    };
    Some(converter)
}

fn unconvertible(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: match value {
            Value::Text(s) => format!("text '{}'", s),
            other => other.type_name().to_string(),
        },
        column: None,
    })
}

/// Integers stored as numbers or numeric text.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerConverter;

impl FieldConverter for IntegerConverter {
    fn from_db(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::BigInt)
                .map_err(|_| unconvertible("integer", value)),
            other => other
                .as_i64()
                .map(Value::BigInt)
                .ok_or_else(|| unconvertible("integer", value)),
        }
    }
}

/// Floating point numbers stored as numbers or numeric text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

impl FieldConverter for FloatConverter {
    fn from_db(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| unconvertible("float", value)),
            other => other
                .as_f64()
                .map(Value::Double)
                .ok_or_else(|| unconvertible("float", value)),
        }
    }
}

/// Booleans stored as integers, native booleans or flag text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl FieldConverter for BooleanConverter {
    fn from_db(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "t" | "true" | "y" | "yes" => Ok(Value::Bool(true)),
                "0" | "f" | "false" | "n" | "no" | "" => Ok(Value::Bool(false)),
                _ => Err(unconvertible("boolean", value)),
            },
            other => other
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| unconvertible("boolean", value)),
        }
    }
}

/// Anything rendered as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl FieldConverter for TextConverter {
    fn from_db(&self, value: &Value) -> Result<Value> {
        Ok(match value {
            Value::Null => Value::Null,
            Value::Text(s) => Value::Text(s.clone()),
            Value::Bool(b) => Value::Text(b.to_string()),
            Value::Int(v) => Value::Text(v.to_string()),
            Value::BigInt(v) => Value::Text(v.to_string()),
            Value::Double(v) => Value::Text(v.to_string()),
            Value::Bytes(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
            Value::Json(j) => Value::Text(j.to_string()),
        })
    }
}

/// JSON documents stored as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl FieldConverter for JsonConverter {
    fn from_db(&self, value: &Value) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Json(j) => Ok(Value::Json(j.clone())),
            Value::Text(s) => Ok(Value::Json(serde_json::from_str(s)?)),
            Value::Bytes(b) => Ok(Value::Json(serde_json::from_slice(b)?)),
            other => Err(unconvertible("JSON text", other)),
        }
    }
}
